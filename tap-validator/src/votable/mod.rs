//! VOTable documents and the parsed query-result view.

pub mod parser;
mod view;

pub use parser::{Field, Info, VoTable};
pub use view::TableView;
