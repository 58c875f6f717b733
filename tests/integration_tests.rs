//! Integration tests for cv-prep

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use cv_prep::{
    Config, JoinMode, MetadataStore, Pipeline, PrepError, RecordSet, SampleEncoding,
    SymphoniaTranscoder, UnifiedRecord,
};

/// Lay out a dataset directory and return a config pointing into it
fn dataset_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.audio_input_dir = root.join("clips");
    config.paths.transcript_table_path = root.join("other.tsv");
    config.paths.duration_table_path = root.join("clip_durations.tsv");
    config.paths.audio_output_dir = root.join("wav_clips");
    config.paths.metadata_output_dir = root.join("metadata");
    config.convert.show_progress = false;
    config.convert.threads = 2;
    config
}

fn write_durations(root: &Path, n: usize) {
    let mut tsv = String::from("clip\tduration[ms]\n");
    for i in 0..n {
        tsv.push_str(&format!("common_voice_te_{}.mp3\t{}\n", 1000 + i, 3000 + i * 10));
    }
    fs::write(root.join("clip_durations.tsv"), tsv).unwrap();
}

fn write_other_table(root: &Path, n: usize) {
    let mut tsv = String::from("client_id\tpath\tsentence_id\tsentence\n");
    for i in 0..n {
        tsv.push_str(&format!(
            "client{}\tcommon_voice_te_{}.mp3\thash{}\tవాక్యం సంఖ్య {}\n",
            i,
            1000 + i,
            i,
            i
        ));
    }
    fs::write(root.join("other.tsv"), tsv).unwrap();
}

fn touch_wavs(root: &Path, n: usize) {
    let dir = root.join("wav_clips");
    fs::create_dir_all(&dir).unwrap();
    for i in 0..n {
        fs::write(dir.join(format!("common_voice_te_{}.wav", 1000 + i)), b"RIFF").unwrap();
    }
}

fn write_tone(path: &Path, sample_rate: u32, frames: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let s = 0.3 * (2.0 * std::f32::consts::PI * 220.0 * t).sin();
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn names(records: &[UnifiedRecord]) -> HashSet<String> {
    records.iter().map(|r| r.file_name.clone()).collect()
}

#[test]
fn test_end_to_end_ten_records() {
    let root = tempfile::tempdir().unwrap();
    write_durations(root.path(), 10);
    write_other_table(root.path(), 10);
    touch_wavs(root.path(), 10);

    let mut config = dataset_config(root.path());
    config.split.ratio = 0.8;
    config.split.seed = 42;
    let pipeline = Pipeline::new(config).unwrap();

    let joined = pipeline.metadata_from_durations().unwrap();
    assert_eq!(joined.records.len(), 10);
    assert_eq!(joined.matched, 10);
    assert_eq!(joined.records[3].text, "వాక్యం సంఖ్య 3");
    assert_eq!(joined.records[3].sentence_id, "1003");
    assert_eq!(joined.records[3].duration_ms, 3030);

    let first = pipeline.split().unwrap();
    assert_eq!(first.split.train.len(), 8);
    assert_eq!(first.split.val.len(), 2);
    assert_eq!(first.summary.files_with_text, 10);

    let store = pipeline.store();
    let train_csv = fs::read(store.csv_path(RecordSet::Train)).unwrap();
    let val_csv = fs::read(store.csv_path(RecordSet::Validation)).unwrap();
    let train_json = fs::read(store.json_path(RecordSet::Train)).unwrap();

    let second = pipeline.split().unwrap();
    assert_eq!(first.split, second.split);
    assert_eq!(fs::read(store.csv_path(RecordSet::Train)).unwrap(), train_csv);
    assert_eq!(fs::read(store.csv_path(RecordSet::Validation)).unwrap(), val_csv);
    assert_eq!(fs::read(store.json_path(RecordSet::Train)).unwrap(), train_json);

    let report = pipeline.verify().unwrap();
    assert!(report.is_ok(), "unexpected report: {:?}", report);
    assert_eq!(report.coverage_percent, 100.0);
}

#[test]
fn test_split_union_reconstructs_complete_set() {
    let root = tempfile::tempdir().unwrap();
    write_durations(root.path(), 23);
    write_other_table(root.path(), 23);

    let mut config = dataset_config(root.path());
    config.split.ratio = 0.7;
    config.split.seed = 11;
    let pipeline = Pipeline::new(config).unwrap();
    pipeline.metadata_from_durations().unwrap();
    pipeline.split().unwrap();

    let store = pipeline.store();
    let complete = store.load_complete().unwrap();
    let train = store.load(RecordSet::Train).unwrap();
    let val = store.load(RecordSet::Validation).unwrap();

    assert_eq!(train.len(), 16);
    assert_eq!(train.len() + val.len(), complete.len());
    assert!(names(&train).is_disjoint(&names(&val)));

    let mut union: Vec<_> = train.into_iter().chain(val).collect();
    union.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    let mut expected = complete;
    expected.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    assert_eq!(union, expected);

    let summary = store.load_summary().unwrap();
    assert_eq!(summary.total_files, 23);
    assert_eq!(summary.seed, 11);
}

#[test]
fn test_verifier_lists_exactly_the_missing_file() {
    let root = tempfile::tempdir().unwrap();
    write_durations(root.path(), 4);
    write_other_table(root.path(), 4);
    touch_wavs(root.path(), 4);
    fs::remove_file(root.path().join("wav_clips/common_voice_te_1002.wav")).unwrap();

    let pipeline = Pipeline::new(dataset_config(root.path())).unwrap();
    pipeline.metadata_from_durations().unwrap();
    pipeline.split().unwrap();

    let report = pipeline.verify().unwrap();
    assert_eq!(report.missing_files, vec!["common_voice_te_1002.wav".to_string()]);
    assert!(report.split_consistent);
    assert!(!report.is_ok());
}

#[test]
fn test_verify_without_metadata_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(dataset_config(root.path())).unwrap();
    assert!(matches!(
        pipeline.verify(),
        Err(PrepError::MissingMetadata(_))
    ));
    assert!(matches!(pipeline.split(), Err(PrepError::MissingMetadata(_))));
}

#[test]
fn test_missing_transcripts_still_produce_records() {
    let root = tempfile::tempdir().unwrap();
    write_durations(root.path(), 3);

    let pipeline = Pipeline::new(dataset_config(root.path())).unwrap();
    let joined = pipeline.metadata_from_durations().unwrap();

    assert_eq!(joined.records.len(), 3);
    assert!(joined.records.iter().all(|r| r.text.is_empty()));
    assert_eq!(pipeline.store().load_complete().unwrap().len(), 3);
}

#[test]
fn test_bad_duration_rows_do_not_abort_metadata() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join("clip_durations.tsv"),
        "clip\tduration[ms]\n\
         common_voice_te_1000.mp3\t5040\n\
         common_voice_te_1001.mp3\t\n\
         common_voice_te_1002.mp3\t3000\n",
    )
    .unwrap();
    write_other_table(root.path(), 3);

    let pipeline = Pipeline::new(dataset_config(root.path())).unwrap();
    let joined = pipeline.metadata_from_durations().unwrap();

    assert_eq!(joined.records.len(), 2);
    assert_eq!(joined.records[0].file_name, "common_voice_te_1000.wav");
    assert_eq!(joined.records[1].file_name, "common_voice_te_1002.wav");
    assert_eq!(pipeline.store().load_complete().unwrap(), joined.records);
}

#[test]
fn test_blank_transcripts_are_not_counted_as_text() {
    let root = tempfile::tempdir().unwrap();
    write_durations(root.path(), 2);
    touch_wavs(root.path(), 2);
    fs::write(
        root.path().join("other.tsv"),
        "path\tsentence\n\
         common_voice_te_1000.mp3\t\n\
         common_voice_te_1001.mp3\tరెండు\n",
    )
    .unwrap();

    let pipeline = Pipeline::new(dataset_config(root.path())).unwrap();
    let joined = pipeline.metadata_from_durations().unwrap();
    assert_eq!(joined.matched, 1);
    assert_eq!(joined.coverage_percent(), 50.0);

    pipeline.split().unwrap();
    let report = pipeline.verify().unwrap();
    assert_eq!(report.coverage_percent, joined.coverage_percent());
}

#[test]
fn test_sentence_id_table_uses_substring_join() {
    let root = tempfile::tempdir().unwrap();
    write_durations(root.path(), 2);
    fs::write(
        root.path().join("validated_sentences.tsv"),
        "sentence_id\tsentence\n\
         x1000y\tfirst\n\
         41000\tsecond\n\
         1001\tthird\n",
    )
    .unwrap();

    let mut config = dataset_config(root.path());
    config.paths.transcript_table_path = root.path().join("validated_sentences.tsv");
    let pipeline = Pipeline::new(config).unwrap();

    let (mode, transcripts) = cv_prep::load_transcripts(
        &pipeline.config().paths.transcript_table_path,
        &pipeline.config().join,
    );
    assert_eq!(
        mode,
        JoinMode::Substring {
            legacy_first_match: false
        }
    );
    assert_eq!(transcripts.len(), 3);

    let joined = pipeline.metadata_from_durations().unwrap();
    assert_eq!(joined.records[0].text, "first");
    assert_eq!(joined.records[1].text, "third");
    assert_eq!(joined.ambiguous.len(), 1);
    assert_eq!(joined.ambiguous[0].file_name, "common_voice_te_1000.wav");
}

#[test]
fn test_convert_real_wav_clips() {
    let root = tempfile::tempdir().unwrap();
    let clips = root.path().join("clips");
    fs::create_dir_all(&clips).unwrap();
    write_tone(&clips.join("clip_1.wav"), 16000, 8000);
    write_tone(&clips.join("clip_2.wav"), 8000, 2400);
    fs::write(clips.join("clip_3.wav"), b"not a wav file").unwrap();
    fs::write(
        root.path().join("other.tsv"),
        "path\tsentence\nclip_1.wav\tone\nclip_2.wav\ttwo\n",
    )
    .unwrap();

    let mut config = dataset_config(root.path());
    config.identifier.prefix = "clip_".to_string();
    config.identifier.source_extension = ".wav".to_string();
    config.identifier.target_extension = ".wav".to_string();
    config.convert.encoding = SampleEncoding::Pcm16;
    let pipeline = Pipeline::new(config).unwrap();

    let outcome = pipeline
        .convert(&SymphoniaTranscoder::new(SampleEncoding::Pcm16))
        .unwrap();

    assert_eq!(outcome.conversion.records.len(), 2);
    assert_eq!(outcome.conversion.failures.len(), 1);
    assert_eq!(outcome.conversion.failures[0].file, "clip_3.wav");
    assert_eq!(outcome.conversion.records[0].duration_ms, 500);
    assert_eq!(outcome.conversion.records[1].duration_ms, 300);

    let written = hound::WavReader::open(root.path().join("wav_clips/clip_1.wav")).unwrap();
    assert_eq!(written.spec().sample_rate, 16000);
    assert_eq!(written.duration(), 8000);

    assert_eq!(outcome.join.records.len(), 2);
    assert_eq!(outcome.join.records[0].sentence_id, "1");
    assert_eq!(outcome.join.records[0].text, "one");
    assert_eq!(outcome.join.records[1].text, "two");

    let store = MetadataStore::new(root.path().join("metadata"));
    assert_eq!(store.load_complete().unwrap(), outcome.join.records);
}

#[test]
fn test_config_from_toml_file() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("cv-prep.toml");
    fs::write(
        &path,
        r#"
            [paths]
            metadata_output_dir = "out/metadata"

            [split]
            ratio = 0.75
            seed = 1234
        "#,
    )
    .unwrap();

    let config = Config::from_file(&path).expect("Failed to parse TOML");
    assert_eq!(config.split.ratio, 0.75);
    assert_eq!(config.split.seed, 1234);
    assert_eq!(
        config.paths.metadata_output_dir,
        std::path::PathBuf::from("out/metadata")
    );

    fs::write(&path, "[split]\nratio = 3.0\n").unwrap();
    assert!(Config::from_file(&path).is_err());
}
