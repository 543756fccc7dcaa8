use divan::{AllocProfiler, Bencher, black_box};
use json_extract::{Selector, extract};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

const SAMPLE_OBJECTS: &[&str] = &[
    r#"{"id":1,"name":"Alice","tags":["rust","parser"]}"#,
    r#"{"id":2,"name":"Bob","tags":[]}"#,
    r#"{"id":3,"name":"Charlie","tags":["streaming","json","benchmark"]}"#,
];

fn generate_array(count: usize) -> String {
    let mut out = String::with_capacity(count * 64 + 2);
    out.push('[');
    for i in 0..count {
        if i > 0 {
            out.push(',');
        }
        out.push_str(SAMPLE_OBJECTS[i % SAMPLE_OBJECTS.len()]);
    }
    out.push(']');
    out
}

#[divan::bench(args = [100, 10_000, 1_000_000])]
fn extract_one_field_per_element(bencher: Bencher, count: usize) {
    let doc = generate_array(count);
    let selector = Selector::parse("*.id").unwrap();
    bencher
        .with_inputs(|| doc.clone())
        .bench_values(|doc| {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let values = extract(black_box(doc.as_bytes()), 4096, &selector)
                    .await
                    .unwrap();
                black_box(values)
            })
        });
}
