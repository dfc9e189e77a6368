static OUTF: std::sync::Mutex<Option<std::fs::File>> = std::sync::Mutex::new(None);

pub fn init(path: &Option<std::path::PathBuf>) -> Result<(), sofa::Error> {
    static CALLED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
    if CALLED.swap(true, std::sync::atomic::Ordering::SeqCst) {
        log::warn!("outf::init() called more than once, keeping the first output");
        return Ok(());
    }
    if let Some(path) = path {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| sofa::Error::Io {
                path: path.clone(),
                source,
            })?;
        install(&OUTF, file, path)?;
    }
    Ok(())
}

fn install(
    slot: &std::sync::Mutex<Option<std::fs::File>>,
    file: std::fs::File,
    path: &std::path::Path,
) -> Result<(), sofa::Error> {
    match slot.lock() {
        Ok(mut outf) => {
            *outf = Some(file);
            Ok(())
        }
        Err(_) => Err(sofa::Error::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "Failed to lock output file"),
        }),
    }
}

pub fn try_write_line(s: &str) -> Result<(), std::io::Error> {
    use std::io::Write;
    match OUTF.lock() {
        Ok(file) => match file.as_ref() {
            Some(mut file) => writeln!(file, "{s}"),
            None => writeln!(std::io::stdout().lock(), "{s}"),
        },
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Failed to lock output file",
        )),
    }
}

pub fn write_line(s: &str) {
    if let Err(e) = try_write_line(s) {
        log::error!("{e:?}");
        println!("{s}");
    }
}

// A `println!`-compatible macro that
// - Writes to the output file given to `init()`, if any
// - Writes to stdout otherwise
// - Falls back to stdout and `log::error!`s if the write fails
#[macro_export]
macro_rules! outfprintln {
    ($($arg:tt)*) => {
        $crate::outf::write_line(&format!($($arg)*))
    }
}

pub use outfprintln;
