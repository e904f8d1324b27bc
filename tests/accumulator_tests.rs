// Tests for the shared audio accumulator
//
// These cover the windowed-extraction math: cursor advancement, overlap
// sharing between consecutive windows, and the tail slice used by the final
// reconciliation pass.

use voicescribe::AudioAccumulator;

/// Samples 0.0, 1.0, 2.0, ... so slice positions are recognizable.
fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32).collect()
}

#[test]
fn next_window_requires_a_full_chunk_of_new_audio() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(99));

    assert_eq!(acc.next_window(100, 30), None);

    acc.append(vec![99.0]);
    assert!(acc.next_window(100, 30).is_some());
}

#[test]
fn first_window_starts_at_zero_and_includes_lookahead() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(200));

    let window = acc.next_window(100, 30).expect("enough audio for a window");

    // [0, 130): chunk plus trailing overlap as lookahead
    assert_eq!(window.len(), 130);
    assert_eq!(window[0], 0.0);
    assert_eq!(window[129], 129.0);
}

#[test]
fn cursor_advances_by_chunk_size_per_mark() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(1000));

    for n in 1..=5 {
        acc.next_window(100, 30).expect("window available");
        acc.mark_processed(100);
        assert_eq!(acc.processed_samples(), n * 100);
    }
}

#[test]
fn cursor_is_clamped_to_total() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(150));

    acc.mark_processed(100);
    acc.mark_processed(100);
    assert_eq!(acc.processed_samples(), 150);
}

#[test]
fn consecutive_windows_share_overlap_samples() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(400));

    let first = acc.next_window(100, 30).unwrap();
    acc.mark_processed(100);
    let second = acc.next_window(100, 30).unwrap();

    // Second window starts at processed - overlap = 70, inside the first
    // window's [0, 130) range: seams get two-sided context.
    assert_eq!(second[0], 70.0);
    let shared = first.iter().filter(|&s| second.contains(s)).count();
    assert!(shared >= 30, "expected at least 30 shared samples, got {shared}");
}

#[test]
fn windows_slice_across_block_boundaries() {
    let acc = AudioAccumulator::new();
    // Same ramp, delivered in uneven capture-callback-sized blocks.
    let all = ramp(300);
    acc.append(all[0..37].to_vec());
    acc.append(all[37..160].to_vec());
    acc.append(all[160..161].to_vec());
    acc.append(all[161..300].to_vec());

    let window = acc.next_window(100, 30).unwrap();
    assert_eq!(window, all[0..130].to_vec());

    acc.mark_processed(100);
    let window = acc.next_window(100, 30).unwrap();
    assert_eq!(window, all[70..200].to_vec());
}

#[test]
fn remaining_tail_is_none_once_everything_is_processed() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(100));

    assert!(acc.remaining_tail(30).is_some());
    acc.mark_processed(100);
    assert_eq!(acc.remaining_tail(30), None);
}

#[test]
fn remaining_tail_length_includes_lookback() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(500));
    acc.mark_processed(200);

    // total - cursor + min(overlap, cursor) = 300 + 50
    let tail = acc.remaining_tail(50).unwrap();
    assert_eq!(tail.len(), 350);
    assert_eq!(tail[0], 150.0);
    assert_eq!(tail[349], 499.0);
}

#[test]
fn remaining_tail_lookback_is_clamped_at_buffer_start() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(100));
    acc.mark_processed(20);

    // Cursor 20, overlap 50: lookback cannot reach before sample 0.
    let tail = acc.remaining_tail(50).unwrap();
    assert_eq!(tail.len(), 100);
    assert_eq!(tail[0], 0.0);
}

#[test]
fn reset_clears_samples_and_cursor() {
    let acc = AudioAccumulator::new();
    acc.append(ramp(300));
    acc.mark_processed(100);

    acc.reset();

    assert_eq!(acc.total_samples(), 0);
    assert_eq!(acc.processed_samples(), 0);
    assert_eq!(acc.next_window(10, 2), None);
    assert_eq!(acc.all_samples(), None);
}

#[test]
fn five_second_chunks_with_three_second_overlap_at_16khz() {
    // sample_rate=16000, chunk=5s -> 80000 samples, overlap=3s -> 48000.
    let chunk = 80_000;
    let overlap = 48_000;

    let acc = AudioAccumulator::new();
    acc.append(ramp(200_000));

    let first = acc.next_window(chunk, overlap).unwrap();
    assert_eq!(first.len(), 128_000);
    assert_eq!(first[0], 0.0);
    assert_eq!(first[127_999], 127_999.0);

    acc.mark_processed(chunk);
    assert_eq!(acc.processed_samples(), 80_000);

    let second = acc.next_window(chunk, overlap).unwrap();
    // start = 80000 - 48000 = 32000, end = min(200000, 32000 + 128000)
    assert_eq!(second[0], 32_000.0);
    assert_eq!(second.len(), 128_000);
    assert_eq!(second[127_999], 159_999.0);

    // Simulate stop with the cursor still at 80000.
    let tail = acc.remaining_tail(overlap).unwrap();
    assert_eq!(tail[0], 32_000.0);
    assert_eq!(tail.len(), 168_000);
    assert_eq!(tail[167_999], 199_999.0);
}

#[test]
fn interleaved_appends_and_marks_preserve_window_availability() {
    let acc = AudioAccumulator::new();

    for round in 0..10 {
        acc.append(ramp(60));
        let total = acc.total_samples();
        let processed = acc.processed_samples();

        let window = acc.next_window(100, 30);
        if total - processed < 100 {
            assert!(window.is_none(), "round {round}: expected None");
        } else {
            assert!(window.is_some(), "round {round}: expected a window");
            acc.mark_processed(100);
        }
    }
}
