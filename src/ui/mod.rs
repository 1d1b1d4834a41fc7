/// User interface building blocks
///
/// Pure view functions over the session state. They never decide
/// anything; every button maps to a `Message`.

pub mod card;
pub mod controls;
pub mod modal;
