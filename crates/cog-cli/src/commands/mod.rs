mod dockerfile;
mod init;

pub use dockerfile::dockerfile;
pub use init::init_project;
