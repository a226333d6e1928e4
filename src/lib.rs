#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod background;
pub mod command;
pub mod components;
pub mod config;
pub mod editor;
pub mod element;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod id_generator;
pub mod input;
pub mod palette;
pub mod panels;
pub mod persistence;
pub mod renderer;
pub mod scene;
pub mod tools;
pub mod util;

pub use app::StagingApp;
pub use background::{BackgroundLoader, ImageCatalog, ImageFetcher, LoadRequest, LoadResult, LocalFetcher};
pub use command::{Command, CommandOutcome, History, HistoryPolicy};
pub use config::EditorConfig;
pub use editor::Editor;
pub use element::{BackgroundImage, BackgroundSource, Element, ObjectKind, SceneObject, Stroke};
pub use error::{EditorError, EditorResult};
pub use export::{ExportFormat, ExportService, ExportedImage};
pub use id_generator::ObjectId;
pub use input::{InputEvent, KeyCommand};
pub use palette::{ColorChoice, PALETTE};
pub use persistence::{PersistenceError, ProjectStore, SceneDocument};
pub use renderer::{render_scene, Renderer};
pub use scene::{CanvasSize, Scene, SceneSnapshot};
pub use tools::{Tool, ToolKind, ToolState};
