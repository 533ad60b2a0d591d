pub mod analysis;
pub mod conversation;
pub mod faq;

pub use analysis::*;
pub use conversation::*;
pub use faq::*;
