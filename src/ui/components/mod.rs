mod input;
mod key_result;
mod select;
mod toasts;

pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use select::{Select, SelectEvent};
pub use toasts::{Toast, ToastLevel, ToastSender, Toasts};
