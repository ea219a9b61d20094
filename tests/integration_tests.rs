//! Integration tests driving the tools against a real document store.
//!
//! Documents are saved to and reopened from temporary directories, so these
//! tests exercise the .docx codec end to end.

use docx_mcp_server::error::{DocxServerError, ErrorKind};
use docx_mcp_server::model::{RunFormatting, RunRef};
use docx_mcp_server::state::DocumentStore;
use docx_mcp_server::tools::*;
use docx_mcp_server::ServerConfig;

/// Store whose relative paths resolve inside `dir`.
fn store_in(dir: &tempfile::TempDir) -> DocumentStore {
    DocumentStore::with_config(ServerConfig {
        documents_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    })
}

fn new_document(store: &DocumentStore) -> String {
    create_document(store, CreateDocumentParams::default())
        .unwrap()
        .document_id
}

fn append(store: &DocumentStore, id: &str, text: &str) -> usize {
    insert_paragraph(
        store,
        InsertParagraphParams {
            document_id: id.to_string(),
            text: text.to_string(),
            index: None,
            style: None,
        },
    )
    .unwrap()
    .index
}

fn texts(store: &DocumentStore, id: &str) -> Vec<String> {
    list_blocks(
        store,
        ListBlocksParams {
            document_id: id.to_string(),
        },
    )
    .unwrap()
    .blocks
    .into_iter()
    .map(|block| block.text.unwrap_or_default())
    .collect()
}

fn bold() -> RunFormatting {
    RunFormatting {
        bold: Some(true),
        ..Default::default()
    }
}

// ============== Session Management Tests ==============

mod session {
    use super::*;

    #[test]
    fn test_hello_world_survives_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        append(&store, &id, "Hello");
        add_run(
            &store,
            AddRunParams {
                document_id: id.clone(),
                paragraph: 0,
                text: " World".to_string(),
                formatting: bold(),
            },
        )
        .unwrap();

        let saved = save_document(
            &store,
            SaveDocumentParams {
                document_id: id.clone(),
                path: Some("x.docx".to_string()),
            },
        )
        .unwrap();
        assert!(dir.path().join("x.docx").exists());
        assert!(saved.path.ends_with("x.docx"));

        close_document(&store, CloseDocumentParams { document_id: id }).unwrap();

        let reopened = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "x.docx".to_string(),
                },
            },
        )
        .unwrap();
        assert_eq!(reopened.block_count, 1);

        let paragraph = get_paragraph(
            &store,
            GetParagraphParams {
                document_id: reopened.document_id,
                index: 0,
            },
        )
        .unwrap();
        assert_eq!(paragraph.text, "Hello World");
        assert_eq!(paragraph.runs.len(), 2);
        assert_ne!(paragraph.runs[0].formatting.bold, Some(true));
        assert_eq!(paragraph.runs[1].formatting.bold, Some(true));
    }

    #[test]
    fn test_save_without_path_after_create() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        let err = save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoPath);
    }

    #[test]
    fn test_create_with_path_binds_save_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let created = create_document(
            &store,
            CreateDocumentParams {
                path: Some("bound.docx".to_string()),
                template: None,
            },
        )
        .unwrap();
        append(&store, &created.document_id, "content");

        save_document(
            &store,
            SaveDocumentParams {
                document_id: created.document_id.clone(),
                path: None,
            },
        )
        .unwrap();
        assert!(dir.path().join("bound.docx").exists());

        let list = list_documents(&store, ListDocumentsParams {}).unwrap();
        assert_eq!(list.documents.len(), 1);
        assert!(!list.documents[0].modified);
    }

    #[test]
    fn test_create_from_template_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);
        append(&store, &id, "boilerplate");
        save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: Some("template.docx".to_string()),
            },
        )
        .unwrap();

        let created = create_document(
            &store,
            CreateDocumentParams {
                path: None,
                template: Some("template.docx".to_string()),
            },
        )
        .unwrap();
        assert_eq!(created.block_count, 1);
        assert_eq!(created.path, None);
    }

    #[test]
    fn test_close_twice_then_use() {
        let store = DocumentStore::new();
        let id = new_document(&store);

        let first = close_document(
            &store,
            CloseDocumentParams {
                document_id: id.clone(),
            },
        )
        .unwrap();
        let second = close_document(
            &store,
            CloseDocumentParams {
                document_id: id.clone(),
            },
        )
        .unwrap();
        assert!(first.was_open);
        assert!(!second.was_open);

        let err = list_blocks(&store, ListBlocksParams { document_id: id }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let err = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "nope.docx".to_string(),
                },
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_open_corrupted_file_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.docx"), b"PK\x03\x04 truncated").unwrap();
        let store = store_in(&dir);

        let err = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "broken.docx".to_string(),
                },
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(list_documents(&store, ListDocumentsParams {})
            .unwrap()
            .documents
            .is_empty());
    }

    #[test]
    fn test_open_invalid_base64() {
        let store = DocumentStore::new();
        let err = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::Base64 {
                    base64: "not base64!!".to_string(),
                },
            },
        )
        .unwrap_err();
        assert!(matches!(err, DocxServerError::Base64Error(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

// ============== Block Tests ==============

mod blocks {
    use super::*;

    #[test]
    fn test_insert_then_delete_restores_document() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        for text in ["a", "b", "c"] {
            append(&store, &id, text);
        }
        let before = texts(&store, &id);

        insert_paragraph(
            &store,
            InsertParagraphParams {
                document_id: id.clone(),
                text: "temporary".to_string(),
                index: Some(1),
                style: None,
            },
        )
        .unwrap();
        delete_block(
            &store,
            DeleteBlockParams {
                document_id: id.clone(),
                index: 1,
            },
        )
        .unwrap();

        assert_eq!(texts(&store, &id), before);
    }

    #[test]
    fn test_insert_out_of_range() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        append(&store, &id, "only");

        let err = insert_paragraph(
            &store,
            InsertParagraphParams {
                document_id: id.clone(),
                text: "far away".to_string(),
                index: Some(5),
                style: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIndex);
        assert_eq!(texts(&store, &id), vec!["only"]);
    }

    #[test]
    fn test_move_block_reorders() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        for text in ["a", "b", "c"] {
            append(&store, &id, text);
        }

        move_block(
            &store,
            MoveBlockParams {
                document_id: id.clone(),
                from: 0,
                to: 2,
            },
        )
        .unwrap();
        assert_eq!(texts(&store, &id), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_failed_move_leaves_document_unchanged() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        for text in ["a", "b"] {
            append(&store, &id, text);
        }

        let err = move_block(
            &store,
            MoveBlockParams {
                document_id: id.clone(),
                from: 1,
                to: 7,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIndex);
        assert_eq!(texts(&store, &id), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_style_rejected() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        let err = insert_paragraph(
            &store,
            InsertParagraphParams {
                document_id: id.clone(),
                text: "styled".to_string(),
                index: None,
                style: Some("Fancy".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStyle);
        assert!(texts(&store, &id).is_empty());
    }

    #[test]
    fn test_headings_and_page_break_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        add_heading(
            &store,
            AddHeadingParams {
                document_id: id.clone(),
                text: "Annual Report".to_string(),
                level: 0,
                index: None,
            },
        )
        .unwrap();
        add_page_break(
            &store,
            AddPageBreakParams {
                document_id: id.clone(),
                index: None,
            },
        )
        .unwrap();
        add_heading(
            &store,
            AddHeadingParams {
                document_id: id.clone(),
                text: "Summary".to_string(),
                level: 1,
                index: None,
            },
        )
        .unwrap();
        save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: Some("report.docx".to_string()),
            },
        )
        .unwrap();

        let reopened = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "report.docx".to_string(),
                },
            },
        )
        .unwrap();
        let blocks = list_blocks(
            &store,
            ListBlocksParams {
                document_id: reopened.document_id,
            },
        )
        .unwrap()
        .blocks;

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].style.as_deref(), Some("Title"));
        assert_eq!(blocks[1].kind, docx_mcp_server::model::BlockKind::PageBreak);
        assert_eq!(blocks[2].style.as_deref(), Some("Heading1"));
        assert_eq!(blocks[2].text.as_deref(), Some("Summary"));
    }

    #[test]
    fn test_text_after_page_break_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        add_page_break(
            &store,
            AddPageBreakParams {
                document_id: id.clone(),
                index: None,
            },
        )
        .unwrap();
        add_run(
            &store,
            AddRunParams {
                document_id: id.clone(),
                paragraph: 0,
                text: "Next page".to_string(),
                formatting: RunFormatting::default(),
            },
        )
        .unwrap();
        save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: Some("breaks.docx".to_string()),
            },
        )
        .unwrap();

        let reopened = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "breaks.docx".to_string(),
                },
            },
        )
        .unwrap()
        .document_id;
        let blocks = list_blocks(
            &store,
            ListBlocksParams {
                document_id: reopened.clone(),
            },
        )
        .unwrap()
        .blocks;
        assert_eq!(blocks[0].kind, docx_mcp_server::model::BlockKind::Paragraph);

        let paragraph = get_paragraph(
            &store,
            GetParagraphParams {
                document_id: reopened,
                index: 0,
            },
        )
        .unwrap();
        assert_eq!(paragraph.text, "Next page");
        assert_eq!(paragraph.page_breaks, [0]);
    }

    #[test]
    fn test_control_characters_rejected_before_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);
        append(&store, &id, "clean");

        let err = insert_paragraph(
            &store,
            InsertParagraphParams {
                document_id: id.clone(),
                text: "bell\u{7}here".to_string(),
                index: None,
                style: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = add_run(
            &store,
            AddRunParams {
                document_id: id.clone(),
                paragraph: 0,
                text: "x\u{1}y".to_string(),
                formatting: RunFormatting::default(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(texts(&store, &id), ["clean"]);

        save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: Some("clean.docx".to_string()),
            },
        )
        .unwrap();
        let reopened = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "clean.docx".to_string(),
                },
            },
        )
        .unwrap()
        .document_id;
        assert_eq!(texts(&store, &reopened), ["clean"]);
    }
}

// ============== Run Formatting Tests ==============

mod runs {
    use super::*;

    #[test]
    fn test_formatting_merge_keeps_unset_fields() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        append(&store, &id, "text");
        let run = RunRef {
            paragraph: 0,
            run: 0,
        };

        set_run_formatting(
            &store,
            SetRunFormattingParams {
                document_id: id.clone(),
                run,
                formatting: bold(),
            },
        )
        .unwrap();
        let merged = set_run_formatting(
            &store,
            SetRunFormattingParams {
                document_id: id,
                run,
                formatting: RunFormatting {
                    italic: Some(true),
                    ..Default::default()
                },
            },
        )
        .unwrap()
        .formatting;

        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.italic, Some(true));
    }

    #[test]
    fn test_heading_effective_formatting() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        add_heading(
            &store,
            AddHeadingParams {
                document_id: id.clone(),
                text: "Heading".to_string(),
                level: 1,
                index: None,
            },
        )
        .unwrap();

        let paragraph = get_paragraph(
            &store,
            GetParagraphParams {
                document_id: id.clone(),
                index: 0,
            },
        )
        .unwrap();
        assert_eq!(paragraph.runs[0].formatting.bold, None);
        assert_eq!(paragraph.runs[0].effective.bold, Some(true));

        set_run_formatting(
            &store,
            SetRunFormattingParams {
                document_id: id.clone(),
                run: RunRef {
                    paragraph: 0,
                    run: 0,
                },
                formatting: RunFormatting {
                    bold: Some(false),
                    ..Default::default()
                },
            },
        )
        .unwrap();
        let paragraph = get_paragraph(
            &store,
            GetParagraphParams {
                document_id: id,
                index: 0,
            },
        )
        .unwrap();
        assert_eq!(paragraph.runs[0].effective.bold, Some(false));
    }

    #[test]
    fn test_add_run_to_table_is_invalid_index() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        add_table(
            &store,
            AddTableParams {
                document_id: id.clone(),
                rows: Some(1),
                cols: Some(1),
                data: None,
                style: None,
                index: None,
            },
        )
        .unwrap();

        let err = add_run(
            &store,
            AddRunParams {
                document_id: id,
                paragraph: 0,
                text: "x".to_string(),
                formatting: RunFormatting::default(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIndex);
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn test_styled_paragraph_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        add_styled_paragraph(
            &store,
            AddStyledParagraphParams {
                document_id: id.clone(),
                runs: vec![
                    StyledRun {
                        text: "Warning: ".to_string(),
                        formatting: RunFormatting {
                            bold: Some(true),
                            color: Some("#c00000".to_string()),
                            ..Default::default()
                        },
                    },
                    StyledRun {
                        text: "check the totals".to_string(),
                        formatting: RunFormatting {
                            italic: Some(true),
                            font_size: Some(10.5),
                            font_name: Some("Georgia".to_string()),
                            ..Default::default()
                        },
                    },
                ],
                style: Some("Body Text".to_string()),
                index: None,
            },
        )
        .unwrap();

        let bytes = store.export(&id).unwrap();
        let reopened = store.open_bytes(&bytes).unwrap();
        let paragraph = get_paragraph(
            &store,
            GetParagraphParams {
                document_id: reopened,
                index: 0,
            },
        )
        .unwrap();

        assert_eq!(paragraph.style.as_deref(), Some("BodyText"));
        assert_eq!(paragraph.text, "Warning: check the totals");
        assert_eq!(paragraph.runs[0].formatting.color.as_deref(), Some("C00000"));
        assert_eq!(paragraph.runs[1].formatting.font_size, Some(10.5));
        assert_eq!(
            paragraph.runs[1].formatting.font_name.as_deref(),
            Some("Georgia")
        );
    }
}

// ============== Table Tests ==============

mod tables {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_table_data_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);
        append(&store, &id, "Inventory");

        add_table(
            &store,
            AddTableParams {
                document_id: id.clone(),
                rows: None,
                cols: None,
                data: Some(grid(&[&["Item", "Qty"], &["Pears", "12"], &["Figs", "4"]])),
                style: None,
                index: None,
            },
        )
        .unwrap();
        add_table_row(
            &store,
            AddTableRowParams {
                document_id: id.clone(),
                table: 1,
                values: Some(vec!["Plums".to_string(), "7".to_string()]),
            },
        )
        .unwrap();
        save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: Some("inventory.docx".to_string()),
            },
        )
        .unwrap();

        let reopened = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "inventory.docx".to_string(),
                },
            },
        )
        .unwrap()
        .document_id;

        let dims = get_table_dimensions(
            &store,
            GetTableDimensionsParams {
                document_id: reopened.clone(),
                table: 1,
            },
        )
        .unwrap();
        assert_eq!((dims.rows, dims.cols), (4, 2));

        let cell = get_cell_text(
            &store,
            GetCellTextParams {
                document_id: reopened,
                table: 1,
                row: 3,
                col: 0,
            },
        )
        .unwrap();
        assert_eq!(cell.text, "Plums");
    }

    #[test]
    fn test_table_data_shape_mismatch() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        let err = add_table(
            &store,
            AddTableParams {
                document_id: id.clone(),
                rows: Some(2),
                cols: Some(2),
                data: Some(grid(&[&["only one row", "x"]])),
                style: None,
                index: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(texts(&store, &id).is_empty());
    }

    #[test]
    fn test_table_index_used_as_paragraph() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        add_table(
            &store,
            AddTableParams {
                document_id: id.clone(),
                rows: Some(2),
                cols: Some(3),
                data: None,
                style: Some("Light Shading Accent 1".to_string()),
                index: None,
            },
        )
        .unwrap();

        let err = get_paragraph_text(
            &store,
            GetParagraphTextParams {
                document_id: id,
                index: 0,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIndex);
    }
}

// ============== Picture Tests ==============

mod pictures {
    use super::*;
    use docx_mcp_server::model::BlockKind;

    fn picture_params(id: &str, path: &str) -> AddPictureParams {
        AddPictureParams {
            document_id: id.to_string(),
            source: ImageSource::FilePath {
                path: path.to_string(),
            },
            width_inches: None,
            height_inches: None,
            index: None,
        }
    }

    #[test]
    fn test_picture_survives_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        image::DynamicImage::new_rgb8(300, 150)
            .save(dir.path().join("chart.png"))
            .unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);
        append(&store, &id, "Figure 1");

        let added = add_picture(
            &store,
            AddPictureParams {
                width_inches: Some(3.0),
                ..picture_params(&id, "chart.png")
            },
        )
        .unwrap();
        assert_eq!(added.index, 1);
        assert_eq!(added.height_inches, 1.5);

        save_document(
            &store,
            SaveDocumentParams {
                document_id: id,
                path: Some("figures.docx".to_string()),
            },
        )
        .unwrap();
        let reopened = open_document(
            &store,
            OpenDocumentParams {
                source: DocumentSource::FilePath {
                    path: "figures.docx".to_string(),
                },
            },
        )
        .unwrap();
        assert_eq!(reopened.block_count, 2);

        let blocks = list_blocks(
            &store,
            ListBlocksParams {
                document_id: reopened.document_id,
            },
        )
        .unwrap()
        .blocks;
        assert_eq!(blocks[0].text.as_deref(), Some("Figure 1"));
        assert_eq!(blocks[1].kind, BlockKind::Picture);
        assert_eq!(blocks[1].width_inches, Some(3.0));
        assert_eq!(blocks[1].height_inches, Some(1.5));
    }

    #[test]
    fn test_missing_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        let err = add_picture(&store, picture_params(&id, "nowhere.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(texts(&store, &id).is_empty());
    }

    #[test]
    fn test_non_image_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.png"), "plain text").unwrap();
        let store = store_in(&dir);
        let id = new_document(&store);

        let err = add_picture(&store, picture_params(&id, "notes.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

// ============== Concurrency Tests ==============

mod concurrency {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_runs_on_one_document_serialize() {
        let store = DocumentStore::new();
        let id = new_document(&store);
        append(&store, &id, "start");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let id = id.clone();
                thread::spawn(move || {
                    for j in 0..10 {
                        add_run(
                            &store,
                            AddRunParams {
                                document_id: id.clone(),
                                paragraph: 0,
                                text: format!("[{i}:{j}]"),
                                formatting: RunFormatting::default(),
                            },
                        )
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let paragraph = get_paragraph(
            &store,
            GetParagraphParams {
                document_id: id,
                index: 0,
            },
        )
        .unwrap();
        assert_eq!(paragraph.runs.len(), 81);
    }

    #[test]
    fn test_independent_documents_in_parallel() {
        let store = DocumentStore::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let id = new_document(&store);
                    for n in 0..i + 1 {
                        append(&store, &id, &format!("doc {i} line {n}"));
                    }
                    (id, i + 1)
                })
            })
            .collect();

        for handle in handles {
            let (id, expected) = handle.join().unwrap();
            assert_eq!(texts(&store, &id).len(), expected);
        }
    }
}

// ============== Dispatch Tests ==============

mod dispatch {
    use docx_mcp_server::command::JsonObject;
    use docx_mcp_server::DocxServer;
    use serde_json::{json, Value};

    fn args(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("arguments must be an object"),
        }
    }

    #[tokio::test]
    async fn test_full_session_through_server() {
        let server = DocxServer::new();
        let created = server
            .execute("create_document", JsonObject::new())
            .await
            .unwrap();
        let id = created["document_id"].as_str().unwrap().to_string();

        server
            .execute(
                "add_styled_paragraph",
                args(json!({
                    "document_id": id,
                    "runs": [
                        {"text": "Total: "},
                        {"text": "42", "formatting": {"bold": true, "font_size_pt": 14}}
                    ]
                })),
            )
            .await
            .unwrap();

        let paragraph = server
            .execute("get_paragraph", args(json!({"document_id": id, "index": 0})))
            .await
            .unwrap();
        assert_eq!(paragraph["text"], "Total: 42");
        assert_eq!(paragraph["runs"][1]["formatting"]["font_size"], 14.0);

        let exported = server
            .execute("export_document", args(json!({"document_id": id})))
            .await
            .unwrap();
        assert!(exported["size"].as_u64().unwrap() > 0);

        let closed = server
            .execute("close_document", args(json!({"document_id": id})))
            .await
            .unwrap();
        assert_eq!(closed["was_open"], true);
    }

    #[test]
    fn test_validation_errors_reach_caller() {
        let server = DocxServer::new();
        let err = tokio_test::block_on(server.execute(
            "add_heading",
            args(json!({"document_id": "x", "text": "t", "level": "one"})),
        ))
        .unwrap_err();
        assert_eq!(err.to_payload().kind.as_str(), "ValidationError");
    }
}
