//! Command table: every tool the server exposes, its parameter type, handler
//! and description, in one place.
//!
//! `Command::parse` is the only way to build a command, so an unknown name or
//! malformed arguments never reach a handler.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DocxServerError, Result};
use crate::state::DocumentStore;
use crate::tools;

/// JSON object carrying tool arguments or a schema.
pub type JsonObject = Map<String, Value>;

/// Tool listing entry.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonObject,
}

fn parse_params<P: DeserializeOwned>(name: &str, args: JsonObject) -> Result<P> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| DocxServerError::validation(format!("invalid arguments for {name}: {e}")))
}

fn to_json<R: Serialize>(result: R) -> Result<Value> {
    serde_json::to_value(result)
        .map_err(|e| DocxServerError::internal(format!("cannot serialize result: {e}")))
}

fn schema_of<P: JsonSchema>() -> JsonObject {
    let schema = SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<P>();
    match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::new(),
    }
}

macro_rules! commands {
    ($( $variant:ident => $name:literal, $params:ty, $handler:path, $description:literal; )*) => {
        /// A validated tool invocation.
        #[derive(Debug)]
        pub enum Command {
            $( $variant($params), )*
        }

        impl Command {
            /// Every tool name, in listing order.
            pub const NAMES: &'static [&'static str] = &[$( $name ),*];

            /// Build a command from a tool name and its JSON arguments.
            pub fn parse(name: &str, args: JsonObject) -> Result<Self> {
                match name {
                    $( $name => Ok(Command::$variant(parse_params(name, args)?)), )*
                    other => Err(DocxServerError::UnknownCommand(other.to_string())),
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( Command::$variant(_) => $name, )*
                }
            }

            /// Run the command against the store and serialize its result.
            pub fn execute(self, store: &DocumentStore) -> Result<Value> {
                match self {
                    $( Command::$variant(params) => to_json($handler(store, params)?), )*
                }
            }
        }

        /// Tool list with input schemas derived from the parameter types.
        pub fn catalog() -> Vec<CommandSpec> {
            vec![
                $( CommandSpec {
                    name: $name,
                    description: $description,
                    input_schema: schema_of::<$params>(),
                }, )*
            ]
        }
    };
}

commands! {
    // Session
    CreateDocument => "create_document", tools::CreateDocumentParams, tools::create_document,
        "Create a new empty document (optionally from a template .docx). Returns a document_id. Pass `path` to bind a default save location.";
    OpenDocument => "open_document", tools::OpenDocumentParams, tools::open_document,
        "Open a .docx from a file path ({\"path\": ...}, relative to the documents directory) or base64 content ({\"base64\": ...}). Returns a document_id.";
    SaveDocument => "save_document", tools::SaveDocumentParams, tools::save_document,
        "Write a document to disk. Without `path`, saves to the path it was opened from or last saved to. The document stays open.";
    CloseDocument => "close_document", tools::CloseDocumentParams, tools::close_document,
        "Close a document and release its handle. Unsaved changes are discarded. Closing twice is not an error.";
    ListDocuments => "list_documents", tools::ListDocumentsParams, tools::list_documents,
        "List open documents with their ids, paths, block counts and unsaved-change flags.";
    ExportDocument => "export_document", tools::ExportDocumentParams, tools::export_document,
        "Return a document as base64-encoded .docx content without writing a file.";

    // Blocks
    ListBlocks => "list_blocks", tools::ListBlocksParams, tools::list_blocks,
        "List the document's top-level blocks (paragraphs, page breaks, tables, pictures) with their indices.";
    GetParagraphText => "get_paragraph_text", tools::GetParagraphTextParams, tools::get_paragraph_text,
        "Get the plain text of the paragraph at a block index.";
    GetParagraph => "get_paragraph", tools::GetParagraphParams, tools::get_paragraph,
        "Get a paragraph's style and runs, with each run's direct and effective formatting.";
    InsertParagraph => "insert_paragraph", tools::InsertParagraphParams, tools::insert_paragraph,
        "Insert a paragraph at a block index (omit `index` to append), optionally with a paragraph style.";
    AddHeading => "add_heading", tools::AddHeadingParams, tools::add_heading,
        "Add a heading. Level 0 is the document title; levels 1-9 use Heading1-Heading9.";
    AddStyledParagraph => "add_styled_paragraph", tools::AddStyledParagraphParams, tools::add_styled_paragraph,
        "Add a paragraph made of several runs, each with its own formatting (bold, italic, underline, font_size, color, font_name).";
    AddPageBreak => "add_page_break", tools::AddPageBreakParams, tools::add_page_break,
        "Insert a manual page break at a block index (omit `index` to append).";
    DeleteBlock => "delete_block", tools::DeleteBlockParams, tools::delete_block,
        "Delete the block (paragraph, page break, table or picture) at an index.";
    MoveBlock => "move_block", tools::MoveBlockParams, tools::move_block,
        "Move a block from one index to another. `to` is the block's final position.";
    SetParagraphStyle => "set_paragraph_style", tools::SetParagraphStyleParams, tools::set_paragraph_style,
        "Apply a paragraph style (by id or display name) to a paragraph.";

    // Runs
    AddRun => "add_run", tools::AddRunParams, tools::add_run,
        "Append a run of text with optional formatting to a paragraph. Returns the run reference.";
    SetRunFormatting => "set_run_formatting", tools::SetRunFormattingParams, tools::set_run_formatting,
        "Change formatting of an existing run. Only the given fields change; the rest keep their values.";

    // Tables
    AddTable => "add_table", tools::AddTableParams, tools::add_table,
        "Insert a table of rows x cols, optionally filled from `data` (a list of rows). Default style is TableGrid.";
    AddTableRow => "add_table_row", tools::AddTableRowParams, tools::add_table_row,
        "Append a row to a table, optionally with one value per column.";
    SetCellText => "set_cell_text", tools::SetCellTextParams, tools::set_cell_text,
        "Replace the text of a table cell. Each line of the text becomes a paragraph in the cell.";
    GetCellText => "get_cell_text", tools::GetCellTextParams, tools::get_cell_text,
        "Get the text of a table cell.";
    GetTableDimensions => "get_table_dimensions", tools::GetTableDimensionsParams, tools::get_table_dimensions,
        "Get a table's row and column count.";

    // Pictures
    AddPicture => "add_picture", tools::AddPictureParams, tools::add_picture,
        "Insert a PNG, JPEG, GIF or BMP image as its own block. `source` is a file path ({\"path\": ...}) or base64 content ({\"base64\": ...}). Give width_inches and/or height_inches; with one side only, the aspect ratio is kept. Omit both for the image's size at 96 DPI.";

    // Styles
    ListStyles => "list_styles", tools::ListStylesParams, tools::list_styles,
        "List the styles defined in a document, optionally filtered by kind (paragraph, character, table).";
}
