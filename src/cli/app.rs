use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "salvage")]
#[command(about = "Offline row salvage from InnoDB tablespace files")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Append NDJSON run events to a file
    #[arg(long = "event-log", global = true)]
    pub event_log: Option<String>,

    /// Use memory-mapped I/O for reading tablespace files
    #[arg(long, global = true)]
    pub mmap: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode leaf page records from every .ibd file under a directory
    Extract {
        /// Directory to search recursively for .ibd files
        #[arg(short, long)]
        datadir: String,

        /// Inline record layout, e.g. "id:int,email:string,active:bool"
        #[arg(short, long)]
        schema: Option<String>,

        /// JSON file with the record layout
        #[arg(long = "schema-file")]
        schema_file: Option<String>,

        /// Byte offset of the first record slot in a leaf page
        #[arg(long = "record-start")]
        record_start: Option<usize>,

        /// Distance in bytes between record slots
        #[arg(long)]
        stride: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Collect parent-node page numbers for files matching a name prefix
    Nodes {
        /// Directory to search recursively
        #[arg(short, long)]
        datadir: String,

        /// File name prefix of the table's tablespace files
        #[arg(long, default_value = "wp_newsletter")]
        prefix: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List every page of a tablespace file with its type and kind
    Pages {
        /// Path to InnoDB data file (.ibd)
        #[arg(short, long)]
        file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Decode records from one tablespace file or one page of it
    Scan {
        /// Path to InnoDB data file (.ibd)
        #[arg(short, long)]
        file: String,

        /// Scan only the page at this position in the file
        #[arg(short, long)]
        page: Option<u64>,

        /// Inline record layout, e.g. "id:int,email:string,active:bool"
        #[arg(short, long)]
        schema: Option<String>,

        /// JSON file with the record layout
        #[arg(long = "schema-file")]
        schema_file: Option<String>,

        /// Byte offset of the first record slot in a leaf page
        #[arg(long = "record-start")]
        record_start: Option<usize>,

        /// Distance in bytes between record slots
        #[arg(long)]
        stride: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
