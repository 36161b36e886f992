use std::path::PathBuf;

fn main() {
    let mut args = std::env::args().skip(1);
    let frame_source = match args.next() {
        Some(arg) if arg == "-h" || arg == "--help" => {
            println!("Usage: textlens [IMAGE]\n");
            println!("IMAGE is served as the camera frame; defaults to `frame_source` in the config.\n");
            println!("{}", textlens_lib::commands::USAGE);
            return;
        }
        Some(path) => Some(PathBuf::from(path)),
        None => None,
    };
    if args.next().is_some() {
        eprintln!("Usage: textlens [IMAGE]");
        std::process::exit(2);
    }

    textlens_lib::run(frame_source)
}
