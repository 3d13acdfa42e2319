//! Page-controller behaviour without a network

use base64::Engine as _;
use rfmask::encoding::payload_of;
use rfmask::{
    base64_to_blob_chunked, CanvasSize, EditorConfig, Error, MaskEditor, SaveOutcome,
    SelectedFile, SkipReason,
};

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn local_editor() -> MaskEditor {
    MaskEditor::new(EditorConfig {
        upload_enabled: false,
        ..Default::default()
    })
}

#[test]
fn non_image_files_are_rejected_for_any_media_type() {
    for mt in ["text/plain", "application/pdf", "", "video/mp4", "imagex/png"] {
        let mut editor = local_editor();
        let err = editor
            .select_file(&SelectedFile::new("f", mt, vec![1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFileType(_)), "{}", mt);
        assert!(err.to_string().contains("Please upload a valid image file."));
        assert!(editor.background_image().is_none());
        assert!(editor.masked_image().is_none());
        assert!(editor.upload_result().is_none());
    }
}

#[test]
fn accepted_image_becomes_background_data_url() {
    let mut editor = local_editor();
    let bytes = png_bytes(10, 10, [1, 2, 3, 255]);
    editor
        .select_file(&SelectedFile::new("a.png", "image/png", bytes.clone()))
        .unwrap();

    let expected = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    );
    assert_eq!(editor.background_image().map(|b| b.as_str()), Some(expected.as_str()));
    assert!(editor.masked_image().is_none());
}

#[test]
fn saved_mask_is_opaque_canvas_sized_png() {
    let mut editor = local_editor();
    editor
        .select_file(&SelectedFile::new("a.png", "image/png", png_bytes(64, 64, [200, 0, 0, 255])))
        .unwrap();
    editor.set_brush_radius(10);
    editor.stroke(&[(100.0, 250.0), (400.0, 250.0)]);

    assert!(matches!(editor.save().unwrap(), SaveOutcome::Captured));
    let mask = editor.masked_image().expect("mask captured");
    assert_eq!(mask.media_type(), Some("image/png"));

    let decoded = image::load_from_memory(&mask.decode().unwrap()).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (500, 500));
    // background colour never leaks into the mask
    assert_eq!(decoded.get_pixel(10, 10).0, [0, 0, 0, 255]);
    assert_eq!(decoded.get_pixel(250, 250).0, [255, 255, 255, 255]);
    assert!(decoded.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn resaving_recomputes_mask() {
    let mut editor = local_editor();
    editor.save().unwrap();
    let blank = editor.masked_image().cloned();
    editor.stroke(&[(20.0, 20.0)]);
    editor.save().unwrap();
    assert_ne!(editor.masked_image().cloned(), blank);
}

#[test]
fn custom_canvas_size_is_honoured() {
    let mut editor = MaskEditor::new(EditorConfig {
        canvas: CanvasSize { width: 120, height: 80 },
        upload_enabled: false,
        ..Default::default()
    });
    editor.save().unwrap();
    let bytes = editor.masked_image().unwrap().decode().unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (120, 80));
}

#[test]
fn upload_without_background_is_skipped() {
    let mut editor = MaskEditor::new(EditorConfig::default());
    match editor.save().unwrap() {
        SaveOutcome::Skipped(SkipReason::MissingPayload) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!editor.is_loading());
}

#[test]
fn chunked_decode_round_trips_for_all_chunk_sizes() {
    let engine = base64::engine::general_purpose::STANDARD;
    let original: Vec<u8> = (0..=255u8).cycle().take(70_001).collect();
    let encoded = engine.encode(&original);

    let outputs: Vec<Vec<u8>> = [1usize, 512, 1024, 100_000]
        .iter()
        .map(|&n| {
            base64_to_blob_chunked(&encoded, "image/png", n)
                .unwrap()
                .into_bytes()
        })
        .collect();

    for out in &outputs {
        assert_eq!(out, &outputs[0]);
        assert_eq!(engine.encode(out), encoded);
    }
}

#[test]
fn mask_payload_decodes_to_png() {
    let mut editor = local_editor();
    editor.save().unwrap();
    let mask = editor.masked_image().unwrap();
    let payload = payload_of(mask.as_str()).unwrap();
    let blob = base64_to_blob_chunked(payload, "image/png", 1024).unwrap();
    assert_eq!(&blob.bytes()[..4], b"\x89PNG");
}
