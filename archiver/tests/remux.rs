//! ffmpeg remux tests against shell-script stand-ins for the real binary.

#![cfg(unix)]

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use bili_archiver::{
    Error,
    remux::{FfmpegRemuxer, Remuxer},
};

/// Write an executable `sh` script named `ffmpeg` into `dir`.
fn stub(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_successful_remux_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let ffmpeg = stub(
        dir.path(),
        &format!(
            r#"if [ "$1" = "-version" ]; then echo "ffmpeg version 7.1-stub"; exit 0; fi
echo "$@" > "{}"
for last; do :; done
printf merged > "$last"
echo "frame=1 fps=0.0 q=-1.0 size=1kB" >&2"#,
            args_file.display()
        ),
    );

    let remuxer = FfmpegRemuxer::new(ffmpeg.to_string_lossy());
    assert_eq!(remuxer.version().await.as_deref(), Some("ffmpeg version 7.1-stub"));

    let video = dir.path().join("bilibili_video_1.m4s");
    let audio = dir.path().join("bilibili_audio_1.m4s");
    let output = dir.path().join("夏日[1080P,192K].mp4");
    std::fs::write(&video, "v").unwrap();
    std::fs::write(&audio, "a").unwrap();

    let location = remuxer.remux(&video, &audio, &output).await.unwrap();
    assert_eq!(location, output);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "merged");

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.trim(),
        format!(
            "-y -i {} -i {} -c copy -shortest {}",
            video.display(),
            audio.display(),
            output.display()
        )
    );
    assert!(video.exists() && audio.exists());
}

#[tokio::test]
async fn test_failed_remux_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = stub(
        dir.path(),
        r#"if [ "$1" = "-version" ]; then echo "ffmpeg version 7.1-stub"; exit 0; fi
echo "Input #0, mov,mp4,m4a,3gp,3g2,mj2" >&2
echo "moov atom not found" >&2
exit 1"#,
    );

    let remuxer = FfmpegRemuxer::new(ffmpeg.to_string_lossy());
    let output = dir.path().join("out.mp4");
    let err = remuxer
        .remux(Path::new("v.m4s"), Path::new("a.m4s"), &output)
        .await
        .unwrap_err();

    match err {
        Error::Remux { status, stderr } => {
            assert!(status.contains('1'));
            assert!(stderr.ends_with("moov atom not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_version_is_checked_once() {
    let dir = tempfile::tempdir().unwrap();
    let version_calls = dir.path().join("version_calls.txt");
    let ffmpeg = stub(
        dir.path(),
        &format!(
            r#"if [ "$1" = "-version" ]; then echo called >> "{}"; echo "ffmpeg version 7.1-stub"; exit 0; fi
for last; do :; done
printf merged > "$last""#,
            version_calls.display()
        ),
    );

    let remuxer = FfmpegRemuxer::new(ffmpeg.to_string_lossy());
    for n in 0..2 {
        let output = dir.path().join(format!("out{n}.mp4"));
        remuxer
            .remux(Path::new("v.m4s"), Path::new("a.m4s"), &output)
            .await
            .unwrap();
        assert!(output.exists());
    }

    assert_eq!(std::fs::read_to_string(&version_calls).unwrap().lines().count(), 1);
}
