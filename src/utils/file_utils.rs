use std::fs::File;
use std::path::Path;

pub const IO_BUFFER_SIZE: usize = 64 * 1024; // 64kb

pub fn file_writer<W>(w: W) -> std::io::BufWriter<W>
where
    W: std::io::Write,
{
    std::io::BufWriter::with_capacity(IO_BUFFER_SIZE, w)
}

pub fn file_reader<R>(r: R) -> std::io::BufReader<R>
where
    R: std::io::Read,
{
    std::io::BufReader::with_capacity(IO_BUFFER_SIZE, r)
}

pub fn open_file(file_name: &Path) -> Result<File, std::io::Error> {
    File::open(file_name).map_err(|err| {
        std::io::Error::new(
            err.kind(),
            format!("File not found {} - {err}", file_name.display()),
        )
    })
}
