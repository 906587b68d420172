pub mod recorder;
pub mod samples;

pub use recorder::EventRecorder;
pub use samples::{employee_tree, primitive_rows, product_data};
