use std::path::PathBuf;

/// Generates `out.1.h264`, `out.2.h264`, ... for an output path `out.h264`.
pub struct NumberedOutputNamer {
    output_path: PathBuf,
    /// The count of files that have been generated.
    file_count: u32,
    file_extension: String,
}

impl NumberedOutputNamer {
    pub fn new(output_path: PathBuf) -> Self {
        let file_extension = output_path
            .extension()
            .unwrap_or_default()
            .to_str()
            .unwrap_or_default()
            .to_string();

        Self {
            output_path,
            file_count: 0,
            file_extension,
        }
    }

    pub fn next_path(&mut self) -> PathBuf {
        self.file_count += 1;
        self.get_path(self.file_count)
    }

    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    fn get_path(&self, file_id: u32) -> PathBuf {
        if self.file_extension.is_empty() {
            self.output_path.with_extension(file_id.to_string())
        } else {
            self.output_path
                .with_extension(format!("{file_id}.{}", self.file_extension))
        }
    }
}
