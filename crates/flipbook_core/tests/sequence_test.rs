use flipbook_core::{Dimensions, FrameFile, SequenceKey};

fn sorted(names: &[&str]) -> Vec<String> {
    let mut owned: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    owned.sort_by(|a, b| SequenceKey::new(a).cmp(&SequenceKey::new(b)).then_with(|| a.cmp(b)));
    owned
}

#[test]
fn test_numeric_runs_sort_by_value() {
    let names = ["frame_10.png", "frame_2.png", "frame_1.png", "frame_20.png"];
    assert_eq!(
        sorted(&names),
        vec!["frame_1.png", "frame_2.png", "frame_10.png", "frame_20.png"]
    );
}

#[test]
fn test_padded_and_unpadded_names_interleave() {
    let names = ["frame_003.png", "frame_2.png", "frame_0001.png"];
    assert_eq!(
        sorted(&names),
        vec!["frame_0001.png", "frame_2.png", "frame_003.png"]
    );
}

#[test]
fn test_text_segments_compare_lexically() {
    assert!(SequenceKey::new("a_1.png") < SequenceKey::new("b_1.png"));
    assert!(SequenceKey::new("shot2_frame9") < SequenceKey::new("shot10_frame1"));
}

#[test]
fn test_sorting_is_idempotent() {
    let once = sorted(&["f_9", "f_11", "f_10", "f_1"]);
    let refs: Vec<&str> = once.iter().map(String::as_str).collect();
    assert_eq!(sorted(&refs), once);
}

#[test]
fn test_frame_file_carries_key_of_its_name() {
    let frame = FrameFile::new("/frames/run_1/frame_0010.png", Dimensions::new(8, 8));
    assert_eq!(frame.sequence_key(), &SequenceKey::new("frame_0010.png"));
    assert_eq!(frame.sequence_key().first_number(), Some("0010"));
    assert!(
        FrameFile::new("frame_2.png", Dimensions::new(8, 8)).sequence_key() < frame.sequence_key()
    );
}
