pub mod annotation_list;
pub mod notice;
pub mod panel_view;
pub mod query_form;
pub mod value_picker;

pub use annotation_list::AnnotationList;
pub use notice::{Notice, NoticeKind};
pub use panel_view::{panel_fields, panel_lines, PanelEditor, PanelField};
pub use query_form::{FormKind, FormRequest, QueryForm, Section, TextField};
pub use value_picker::ValuePicker;
