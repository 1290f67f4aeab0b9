use std::fs;

use framelink_session::Client;
use framelink_wire::{Frame, WireConfig};

use crate::cmd::{parse_duration, RequestArgs};
use crate::exit::{io_error, session_error, CliResult, SUCCESS};
use crate::output::{print_response, OutputFormat};

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let frames = resolve_frames(&args.frames)?;

    let config = WireConfig {
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        ..WireConfig::default()
    };

    let mut client = Client::connect_with_config(&args.path, config)
        .map_err(|err| session_error("connect failed", err))?;
    let response = client
        .request(&frames)
        .map_err(|err| session_error("request failed", err))?;
    client
        .close()
        .map_err(|err| session_error("close failed", err))?;

    print_response(&response, format);
    Ok(SUCCESS)
}

/// Turns `--frame` specs into payloads. A leading `@` reads the rest of the
/// spec as a file path; anything else is taken as literal UTF-8 bytes.
fn resolve_frames(specs: &[String]) -> CliResult<Vec<Frame>> {
    let mut frames = Vec::with_capacity(specs.len());
    for spec in specs {
        let payload = match spec.strip_prefix('@') {
            Some(path) => fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {path}"), err))?,
            None => spec.clone().into_bytes(),
        };
        frames.push(Frame::new(payload));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_specs_become_frames() {
        let frames = resolve_frames(&["hello".to_string(), String::new()])
            .expect("literal specs should resolve");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref(), b"hello");
        assert!(frames[1].is_empty());
    }

    #[test]
    fn at_prefix_reads_file_contents() {
        let dir = std::env::temp_dir().join(format!(
            "flink-req-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock after epoch")
                .subsec_nanos()
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        let file = dir.join("payload.bin");
        fs::write(&file, b"from-file").expect("write payload");

        let spec = format!("@{}", file.display());
        let frames = resolve_frames(&[spec]).expect("file spec should resolve");
        assert_eq!(frames[0].as_ref(), b"from-file");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_frames(&["@/nonexistent/framelink/payload".to_string()])
            .expect_err("missing file should fail");
        assert!(err.message.contains("/nonexistent/framelink/payload"));
    }
}
