//! Template application with a conservative slide-layout fallback,
//! written against a narrow automation host interface.

pub mod applicator;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod memory;
pub mod progress;
pub mod text;
pub mod types;

pub use applicator::{list_presentations, TemplateApplicator};
pub use config::Settings;
pub use error::{Error, Result};
pub use host::{Document, Host, TitleProbe};
pub use layout::{collect_no_title, normalize_layouts, NormalizeOptions};
pub use progress::{ProgressEvent, Stage};
pub use types::{is_presentation_file, LayoutInfo, NoTitleSet, PresentationFormat};
