fn main() {
    if let Err(err) = kamikaze_render::run() {
        eprintln!("Application error: {err}");
    }
}
