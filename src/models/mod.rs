pub mod paste;

pub use paste::{
    CreatePaste, ExpiresIn, NewPaste, Owner, Paste, PasteChanges, language_from_extension,
    split_extension,
};
