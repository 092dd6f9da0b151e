use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sheetbridge::core::aggregator::{StreamAggregator, TransportOutcome};
use sheetbridge::core::response_format::format_result;
use sheetbridge::core::stream_event::parse_event_lines;
use sheetbridge::utils::line_buffer::SseLineBuffer;

fn make_stream(progress_events: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..progress_events {
        if i % 25 == 0 {
            body.push_str(&format!(
                "data: {{\"type\":\"tool_call\",\"message\":\"read_range(A{i}:F{})\"}}\n\n",
                i + 25
            ));
        }
        body.push_str(&format!(
            "data: {{\"type\":\"progress\",\"message\":\"Processed row {i} of {progress_events}\"}}\n\n"
        ));
    }
    body.push_str(
        "data: {\"type\":\"response\",\"message\":\"Updated the sheet\",\"conversation_id\":\"conv-1\",\"turn_count\":4}\n\n",
    );
    body.into_bytes()
}

fn consume(body: &[u8], chunk_size: usize) -> String {
    let mut buffer = SseLineBuffer::default();
    let mut aggregator = StreamAggregator::new();
    for chunk in body.chunks(chunk_size) {
        aggregator.extend(parse_event_lines(buffer.push(chunk)));
    }
    aggregator.extend(parse_event_lines(buffer.finish()));
    format_result(&aggregator.finish(TransportOutcome::Completed))
}

fn bench_format_summary(c: &mut Criterion) {
    for &events in &[100usize, 2_000usize] {
        let body = make_stream(events);

        let mut group = c.benchmark_group(format!("format_summary_events{events}"));
        group.throughput(Throughput::Bytes(body.len() as u64));

        // Network reads rarely line up with event boundaries.
        for &chunk_size in &[64usize, 4096usize] {
            group.bench_function(BenchmarkId::new("chunked", chunk_size), |b| {
                b.iter(|| consume(&body, chunk_size))
            });
        }

        group.finish();
    }
}

criterion_group!(benches, bench_format_summary);
criterion_main!(benches);
