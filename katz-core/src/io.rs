use crate::error::KatzError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Builds an output path next to an input path, with a new extension.
///
/// Example:
/// `data/rhyme.txt` + `"bin"` → `data/rhyme.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = input_path.parent().map(Path::to_path_buf).unwrap_or_default();
	output.push(file_stem);
	output.set_extension(output_extension);
	Ok(output)
}

/// Encodes `value` with postcard and writes it to `path`.
pub(crate) fn write_encoded<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), KatzError> {
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads and decodes a value written by [`write_encoded`].
pub(crate) fn read_encoded<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, KatzError> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}
