use assert_cmd::Command;
use std::path::PathBuf;
use std::time::Duration;

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("iris-cli-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn unopenable_camera_source_exits_nonzero() {
    let dir = fixture_dir("empty");
    Command::cargo_bin("iris")
        .unwrap()
        .args([
            "--source",
            &format!("{}/*.png", dir.display()),
            "--no-audio",
            "--loop-once",
        ])
        .write_stdin("")
        .timeout(Duration::from_secs(30))
        .assert()
        .failure();
}

#[test]
fn single_pass_over_frames_exits_cleanly() {
    let dir = fixture_dir("pass");
    let img = image::ImageBuffer::from_pixel(4, 4, image::Rgb([128u8, 128, 128]));
    img.save(dir.join("frame.png")).unwrap();

    Command::cargo_bin("iris")
        .unwrap()
        .args([
            "--source",
            &format!("{}/*.png", dir.display()),
            "--no-audio",
            "--loop-once",
            "--frame-interval-ms",
            "1",
            "--mode",
            "scene",
        ])
        .write_stdin("")
        .timeout(Duration::from_secs(30))
        .assert()
        .success();
}

#[test]
fn quit_command_stops_a_cycling_stream() {
    let dir = fixture_dir("quit");
    let img = image::ImageBuffer::from_pixel(4, 4, image::Rgb([10u8, 10, 10]));
    img.save(dir.join("frame.png")).unwrap();

    Command::cargo_bin("iris")
        .unwrap()
        .args([
            "--source",
            &format!("{}/*.png", dir.display()),
            "--no-audio",
            "--frame-interval-ms",
            "5",
        ])
        .write_stdin("q\n")
        .timeout(Duration::from_secs(30))
        .assert()
        .success();
}
