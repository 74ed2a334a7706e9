//! Every toggle the copy-in core observes, gathered into one explicit
//! struct instead of the process-wide globals the original carried. The
//! CLI layer constructs one `Options` and hands it to the driver by
//! reference; nothing here is ever read from `static` state.

#[derive(Clone, Debug)]
pub struct Options {
    pub to_stdout: bool,
    pub table_flag: bool,
    pub verbose_flag: bool,
    pub numeric_uid: bool,
    pub dot_flag: bool,
    pub quiet_flag: bool,

    pub rename_flag: bool,
    pub rename_batch_file: Option<String>,

    pub pattern_file_name: Option<String>,
    pub patterns: Vec<String>,
    pub copy_matching_files: bool,

    pub unconditional_flag: bool,
    pub create_dir_flag: bool,

    pub no_chown_flag: bool,
    pub set_owner: Option<u32>,
    pub set_group: Option<u32>,
    pub retain_time_flag: bool,

    pub no_abs_paths_flag: bool,

    pub swap_bytes_flag: bool,
    pub swap_halfwords_flag: bool,

    pub only_verify_crc_flag: bool,
    pub append_flag: bool,

    /// Terminator for non-verbose listing lines: `\n` normally, `\0` with
    /// `-0`/null-separated output.
    pub name_end: u8,

    pub io_block_size: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            to_stdout: false,
            table_flag: false,
            verbose_flag: false,
            numeric_uid: false,
            dot_flag: false,
            quiet_flag: false,
            rename_flag: false,
            rename_batch_file: None,
            pattern_file_name: None,
            patterns: Vec::new(),
            copy_matching_files: true,
            unconditional_flag: false,
            create_dir_flag: false,
            no_chown_flag: false,
            set_owner: None,
            set_group: None,
            retain_time_flag: false,
            no_abs_paths_flag: false,
            swap_bytes_flag: false,
            swap_halfwords_flag: false,
            only_verify_crc_flag: false,
            append_flag: false,
            name_end: b'\n',
            io_block_size: 512,
        }
    }
}
