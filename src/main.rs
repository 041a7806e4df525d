//! # Voxel World Entry Point
//!
//! Runs a headless session of the voxel world.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- [config.json]
//! ```

fn main() {
    let config_path = std::env::args().nth(1);
    if let Err(err) = voxel_world::run(config_path) {
        eprintln!("voxel-world: {err}");
        std::process::exit(1);
    }
}
