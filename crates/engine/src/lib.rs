#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `engine` is the orchestrator: it resolves the zsync control file
//! (local or remote), chains seeds through the block matcher into the
//! output writer, and falls back to a single ranged HTTP fetch for
//! whatever the seeds could not recover.
//!
//! # Design
//!
//! [`run`] follows the contractual order: open the control file, parse
//! it, determine the output path (adding a pre-existing output file as
//! the first seed), resolve the target URL, scan every seed in order,
//! fetch whatever remains missing, then close the writer. Every step
//! emits lifecycle events through an [`events::Dispatcher`].

mod error;
mod options;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use control::ControlFile;
use events::{Dispatcher, ZsyncEvent};
use fetch::{HttpTransport, RangeFetcher};
use matching::{BlockMatcher, BlockSink, HashIndex, RollingBuffer, ZeroPadded};

pub use error::EngineError;
pub use options::ZsyncOptions;

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

fn resolve_target_url(
    control_url: &str,
    explicit_base: Option<&str>,
    discovered_base: Option<&str>,
) -> Result<String, EngineError> {
    if let Ok(direct) = url::Url::parse(control_url) {
        return Ok(direct.to_string());
    }

    let base = discovered_base
        .or(explicit_base)
        .ok_or(EngineError::RelativeUrlWithNoBase)?;
    let base_url = url::Url::parse(base)?;
    let joined = base_url.join(control_url)?;
    Ok(joined.to_string())
}

/// Forwards verified blocks to the writer and emits a [`ZsyncEvent::BlockMatched`]
/// for each one, so the matcher itself never needs to know about the
/// dispatcher.
struct DispatchingSink<'a, S> {
    inner: &'a mut S,
    dispatcher: &'a mut Dispatcher,
}

impl<S: BlockSink> BlockSink for DispatchingSink<'_, S> {
    fn write_block(&mut self, index: usize, bytes: &[u8]) {
        self.inner.write_block(index, bytes);
        self.dispatcher.emit(ZsyncEvent::BlockMatched { block: index });
    }

    fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }
}

fn open_control_file<T: HttpTransport>(
    uri: &str,
    transport: &mut T,
    save_copy: Option<&Path>,
) -> Result<(Vec<u8>, Option<String>), EngineError> {
    if is_remote(uri) {
        let response = transport.get(uri, None, None)?;
        if response.status == 404 {
            return Err(EngineError::ControlFileNotFound {
                uri: uri.to_string(),
            });
        }
        if response.status != 200 {
            return Err(EngineError::Fetch(fetch::FetchError::UnexpectedStatus {
                code: response.status,
            }));
        }
        if let Some(path) = save_copy {
            fs::write(path, &response.body)?;
        }
        Ok((response.body, Some(uri.to_string())))
    } else {
        let path = Path::new(uri);
        if !path.exists() {
            return Err(EngineError::ControlFileNotFound {
                uri: uri.to_string(),
            });
        }
        let mut bytes = Vec::new();
        fs::File::open(path)?.read_to_end(&mut bytes)?;
        Ok((bytes, None))
    }
}

/// Reconstructs the target file described by the zsync control file at
/// `uri`, using `transport` for any HTTP requests the run needs.
///
/// `uri` may be a local filesystem path or an `http(s)://` URL.
///
/// # Errors
///
/// Returns [`EngineError`] for every failure category in this crate's
/// error taxonomy: control file not found or malformed, a relative target
/// URL with no base, seed I/O failures are absorbed internally (the seed
/// is skipped), transport/status/checksum failures during the range
/// fetch, and filesystem failures publishing the output file.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(options, transport, dispatcher)))]
pub fn run<T: HttpTransport>(
    uri: &str,
    mut options: ZsyncOptions,
    mut transport: T,
    dispatcher: &mut Dispatcher,
) -> Result<PathBuf, EngineError> {
    let (control_bytes, discovered_base) =
        open_control_file(uri, &mut transport, options.save_zsync_copy.as_deref())?;
    let control = ControlFile::parse(control_bytes.as_slice())?;

    #[cfg(feature = "tracing")]
    tracing::info!(filename = %control.filename, blocks = control.block_count(), "control file parsed");

    let output_path = options
        .output_override
        .clone()
        .unwrap_or_else(|| PathBuf::from(&control.filename));

    if output_path.exists() {
        options.seeds.insert(0, output_path.clone());
    }

    let target_url = resolve_target_url(
        &control.url,
        options.zsync_source_uri.as_deref(),
        discovered_base.as_deref(),
    )?;

    dispatcher.emit(ZsyncEvent::Started {
        output: output_path.clone(),
    });

    let mut writer = writer::OutputFileWriter::create(&control, &output_path)?;
    let index = HashIndex::build(&control);
    let matcher = BlockMatcher::new(&control, &index);
    let block_size = control.blocksize as usize;

    for seed_path in options.seeds.clone() {
        if writer.is_complete() {
            break;
        }

        let seed_name = seed_path.display().to_string();
        dispatcher.emit(ZsyncEvent::SeedStarted {
            seed: seed_name.clone(),
        });

        let scan_result = fs::File::open(&seed_path).and_then(|file| {
            let padded = ZeroPadded::new(file, block_size);
            let mut buffer = RollingBuffer::new(padded, block_size)?;
            let mut sink = DispatchingSink {
                inner: &mut writer,
                dispatcher: &mut *dispatcher,
            };
            matcher
                .scan(&mut buffer, &mut sink)
                .map_err(std::io::Error::other)?;
            Ok(buffer.bytes_consumed())
        });

        match scan_result {
            Ok(bytes_scanned) => {
                if let Some(err) = writer.take_io_error() {
                    return Err(EngineError::Writer(err));
                }
                dispatcher.emit(ZsyncEvent::SeedFinished {
                    seed: seed_name,
                    bytes_scanned,
                });
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(seed = %seed_name, error = %err, "abandoning seed after read error");
                dispatcher.emit(ZsyncEvent::Failed {
                    reason: format!("seed `{seed_name}` abandoned: {err}"),
                });
            }
        }
    }

    if !writer.is_complete() {
        let missing = writer.missing_ranges();
        for &(lo, hi) in &missing {
            dispatcher.emit(ZsyncEvent::RangeReceived { lo, hi });
        }
        let mut fetcher = RangeFetcher::with_credentials(transport, options.credentials.clone());
        fetcher.fetch_missing(&target_url, &missing, &mut writer)?;
    }

    let final_path = writer.close()?;
    dispatcher.emit(ZsyncEvent::Completed {
        output: final_path.clone(),
    });

    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::strong::{Md4, TruncatedMd4};
    use checksums::RollingChecksum;
    use control::{BlockEntry, SequenceMatch, WholeFileDigest};
    use fetch::RawResponse;
    use std::collections::VecDeque;

    struct FakeTransport(VecDeque<RawResponse>);

    impl HttpTransport for FakeTransport {
        fn get(
            &mut self,
            _url: &str,
            _range_header: Option<&str>,
            _authorization: Option<&str>,
        ) -> Result<RawResponse, fetch::FetchError> {
            self.0
                .pop_front()
                .ok_or_else(|| fetch::FetchError::MalformedResponse {
                    reason: "fake transport exhausted".to_string(),
                })
        }
    }

    fn control_bytes_for(target: &[u8], block_size: u32) -> Vec<u8> {
        let blocks: Vec<BlockEntry> = target
            .chunks(block_size as usize)
            .map(|chunk| {
                let mut padded = chunk.to_vec();
                padded.resize(block_size as usize, 0);
                let mut rolling = RollingChecksum::new();
                rolling.update(&padded);
                BlockEntry {
                    weak: rolling.masked(4),
                    strong: TruncatedMd4::new(3).digest(&padded),
                }
            })
            .collect();
        let whole = Md4::digest(target);

        let mut header = format!(
            "zsync: 0.6.2\nFilename: out.bin\nURL: http://example.com/out.bin\nLength: {}\nBlocksize: {}\nHash-Lengths: 1,4,3\nMD4: ",
            target.len(),
            block_size
        );
        for byte in whole {
            header.push_str(&format!("{byte:02x}"));
        }
        header.push_str("\n\n");

        let mut bytes = header.into_bytes();
        for block in blocks {
            bytes.extend_from_slice(&block.weak.to_be_bytes());
            bytes.extend_from_slice(&block.strong);
        }
        bytes
    }

    struct BlockMatchCounter(std::rc::Rc<std::cell::RefCell<usize>>);

    impl events::Observer for BlockMatchCounter {
        fn on_event(&mut self, event: &ZsyncEvent) {
            if matches!(event, ZsyncEvent::BlockMatched { .. }) {
                *self.0.borrow_mut() += 1;
            }
        }
    }

    #[test]
    fn run_emits_a_block_matched_event_per_recovered_block() {
        let target = b"ABCDEFGH".to_vec();
        let control_path_bytes = control_bytes_for(&target, 4);

        let dir = tempfile::tempdir().unwrap();
        let control_path = dir.path().join("out.bin.zsync");
        fs::write(&control_path, &control_path_bytes).unwrap();

        let seed_path = dir.path().join("seed.bin");
        fs::write(&seed_path, &target).unwrap();

        let output_path = dir.path().join("out.bin");
        let options = ZsyncOptions::new()
            .with_seed(&seed_path)
            .with_output_override(&output_path);

        let transport = FakeTransport(VecDeque::new());
        let mut dispatcher = Dispatcher::new();
        let count = std::rc::Rc::new(std::cell::RefCell::new(0));
        dispatcher.register(Box::new(BlockMatchCounter(count.clone())));

        run(
            control_path.to_str().unwrap(),
            options,
            transport,
            &mut dispatcher,
        )
        .unwrap();

        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn run_recovers_entirely_from_a_matching_seed() {
        let target = b"ABCDEFGH".to_vec();
        let control_path_bytes = control_bytes_for(&target, 4);

        let dir = tempfile::tempdir().unwrap();
        let control_path = dir.path().join("out.bin.zsync");
        fs::write(&control_path, &control_path_bytes).unwrap();

        let seed_path = dir.path().join("seed.bin");
        fs::write(&seed_path, &target).unwrap();

        let output_path = dir.path().join("out.bin");
        let options = ZsyncOptions::new()
            .with_seed(&seed_path)
            .with_output_override(&output_path);

        let transport = FakeTransport(VecDeque::new());
        let mut dispatcher = Dispatcher::new();

        let result = run(
            control_path.to_str().unwrap(),
            options,
            transport,
            &mut dispatcher,
        )
        .unwrap();

        assert_eq!(result, output_path);
        assert_eq!(fs::read(&output_path).unwrap(), target);
    }

    #[test]
    fn run_falls_back_to_range_fetch_with_no_seeds() {
        let target = b"ABCDEFGH".to_vec();
        let control_path_bytes = control_bytes_for(&target, 4);

        let dir = tempfile::tempdir().unwrap();
        let control_path = dir.path().join("out.bin.zsync");
        fs::write(&control_path, &control_path_bytes).unwrap();

        let output_path = dir.path().join("out.bin");
        let options = ZsyncOptions::new().with_output_override(&output_path);

        let transport = FakeTransport(VecDeque::from(vec![RawResponse {
            status: 200,
            content_type: None,
            content_range: None,
            body: target.clone(),
        }]));
        let mut dispatcher = Dispatcher::new();

        let result = run(
            control_path.to_str().unwrap(),
            options,
            transport,
            &mut dispatcher,
        )
        .unwrap();

        assert_eq!(fs::read(&result).unwrap(), target);
    }

    #[test]
    fn run_errors_when_control_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.zsync");

        let transport = FakeTransport(VecDeque::new());
        let mut dispatcher = Dispatcher::new();

        let err = run(
            missing.to_str().unwrap(),
            ZsyncOptions::new(),
            transport,
            &mut dispatcher,
        )
        .unwrap_err();

        assert!(matches!(err, EngineError::ControlFileNotFound { .. }));
    }

    #[test]
    fn resolve_target_url_requires_a_base_for_relative_urls() {
        let err = resolve_target_url("relative.bin", None, None).unwrap_err();
        assert!(matches!(err, EngineError::RelativeUrlWithNoBase));
    }

    #[test]
    fn resolve_target_url_joins_against_discovered_base() {
        let resolved =
            resolve_target_url("relative.bin", None, Some("http://example.com/dir/f.zsync"))
                .unwrap();
        assert_eq!(resolved, "http://example.com/dir/relative.bin");
    }
}
