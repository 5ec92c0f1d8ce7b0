pub mod assets;
pub mod util;

pub use assets::FileLoader;
pub use util::split_csv;
