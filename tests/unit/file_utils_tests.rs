/*!
 * Tests for media file helpers
 */

use std::path::Path;

use unidub::file_utils::{FileManager, MediaType, DEFAULT_CONTENT_TYPE};

use crate::common;

#[test]
fn test_detect_media_type_withKnownExtensions_shouldClassify() {
    assert_eq!(FileManager::detect_media_type("movie.mp4"), MediaType::Video);
    assert_eq!(FileManager::detect_media_type("movie.MKV"), MediaType::Video);
    assert_eq!(FileManager::detect_media_type("voice.wav"), MediaType::Audio);
    assert_eq!(FileManager::detect_media_type("notes.txt"), MediaType::Unknown);
    assert_eq!(FileManager::detect_media_type("no_extension"), MediaType::Unknown);
}

#[test]
fn test_content_type_shouldFallBackToOctetStream() {
    assert_eq!(FileManager::content_type("clip.mov"), "video/quicktime");
    assert_eq!(FileManager::content_type("song.mp3"), "audio/mpeg");
    assert_eq!(FileManager::content_type("archive.unidubpart"), DEFAULT_CONTENT_TYPE);
    assert_eq!(FileManager::content_type("no_extension"), DEFAULT_CONTENT_TYPE);
}

#[test]
fn test_content_type_withLessCommonMediaExtensions_shouldStillBeRecognized() {
    assert_eq!(FileManager::content_type("phone.3gp"), "video/3gpp");
    assert_eq!(FileManager::detect_media_type("phone.3gp"), MediaType::Video);

    assert_eq!(FileManager::content_type("clip.ogv"), "video/ogg");
    assert_eq!(FileManager::detect_media_type("clip.ogv"), MediaType::Video);

    assert_eq!(FileManager::content_type("voice.weba"), "audio/webm");
    assert_eq!(FileManager::detect_media_type("voice.weba"), MediaType::Audio);
}

#[test]
fn test_describe_upload_withExistingFile_shouldUseNameSizeAndType() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_video(dir.path(), "trailer.mp4", 1234).unwrap();

    let request = FileManager::describe_upload(&path).unwrap();

    assert_eq!(request.file_name, "trailer.mp4");
    assert_eq!(request.file_size, 1234);
    assert_eq!(request.content_type, "video/mp4");
}

#[test]
fn test_describe_upload_withMissingFile_shouldFail() {
    assert!(FileManager::describe_upload(Path::new("/definitely/not/here.mp4")).is_err());
    assert!(!FileManager::file_exists("/definitely/not/here.mp4"));
}

#[tokio::test]
async fn test_read_payload_shouldReturnFileBytes() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "clip.webm", b"webm-bytes").unwrap();

    let payload = tokio_test::assert_ok!(FileManager::read_payload(&path).await);
    assert_eq!(&payload[..], b"webm-bytes");

    tokio_test::assert_err!(FileManager::read_payload(dir.path().join("gone.webm")).await);
}
