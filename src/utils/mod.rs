//! Shared helpers: persistence formats, logging setup and terminal output

pub mod logging;
pub mod npy;
pub mod persist;
pub mod progress;
pub mod styling;

pub use logging::init_logging;
pub use npy::{load_numpy_array, save_numpy_array};
pub use persist::{load_object, save_object, write_yaml};
pub use progress::{create_spinner, finish_with_failure, finish_with_success};
pub use styling::{
    print_banner, print_completion, print_config, print_failure, print_info, print_step_header,
    print_step_time, print_success,
};
