use clap::{Parser, Subcommand};

/// Field data collection for election canvassing. The resident list is kept
/// locally and mirrored to a Google spreadsheet through a small backend.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration file. If not provided, fieldcanvass.json is read when it exists
    /// in the current directory. The variables SHEET_ID, GOOGLE_CREDENTIALS and FIELDCANVASS_BACKEND_URL override it.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// If passed as an argument, the list is not fetched from the backend when the session starts. Edits are still
    /// sent to the backend.
    #[clap(long, takes_value = false)]
    pub offline: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Runs the backend in front of the spreadsheet.
    Serve,
    /// Checks the credentials of the configuration and starts a session.
    Login {
        #[clap(short, long, value_parser)]
        username: String,
        #[clap(short, long, value_parser)]
        password: String,
    },
    /// Ends the session. The local list is kept.
    Logout,
    /// (file path) Replaces the list with an .xlsx or .csv file and overwrites the spreadsheet with it.
    Import {
        #[clap(value_parser)]
        file: String,
    },
    /// Prints the residents, one per line.
    List {
        /// (text) Only the residents whose name, guardian's name, ward/house number or house name contain this
        /// text, ignoring case.
        #[clap(short, long, value_parser)]
        query: Option<String>,
        /// Only the residents visited at least once.
        #[clap(long, takes_value = false)]
        visited_only: bool,
    },
    /// Prints the visit counts.
    Stats,
    /// Counts one more visit to a resident.
    Visit {
        #[clap(value_parser)]
        id: String,
    },
    /// Removes one visit from a resident. Does nothing at zero.
    Unvisit {
        #[clap(value_parser)]
        id: String,
    },
    /// Sets the phone number entered by the volunteer.
    Phone {
        #[clap(value_parser)]
        id: String,
        #[clap(value_parser)]
        number: String,
    },
    /// Sets the category. The usual labels are SKY, FIRE, SUN, CLOUD and WIND.
    Category {
        #[clap(value_parser)]
        id: String,
        #[clap(value_parser)]
        label: String,
    },
    /// Sets the remark.
    Remark {
        #[clap(value_parser)]
        id: String,
        #[clap(value_parser)]
        text: String,
    },
    /// Writes the list to <prefix>_<date>.xlsx.
    Export {
        /// (default field_residents) The start of the file name.
        #[clap(long, value_parser)]
        prefix: Option<String>,
        /// (directory, default the current directory) Where to write the file.
        #[clap(long, value_parser)]
        out_dir: Option<String>,
    },
    /// Removes the local list. The spreadsheet is not touched.
    Clear,
}

impl Args {
    /// A copy fit for the logs: the password is masked.
    pub fn redacted(&self) -> Args {
        let mut args = self.clone();
        if let Command::Login { password, .. } = &mut args.command {
            *password = "***".to_string();
        }
        args
    }
}
