use snafu::Snafu;

pub mod auth;
pub mod cache;
pub mod client;
pub mod config_reader;
pub mod export;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;
pub mod server;
pub mod session;
pub mod sheets;
pub mod store;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CanvassError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Cannot read {path}: only .xlsx and .csv files are supported"))]
    UnsupportedFileType { path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("The service account private key is not a valid RSA key"))]
    InvalidKey {
        source: jsonwebtoken::errors::Error,
    },
    #[snafu(display("Request to {url} failed"))]
    Http { source: reqwest::Error, url: String },
    #[snafu(display("{url} answered with status {status}: {body}"))]
    RemoteStatus {
        url: String,
        status: u16,
        body: String,
    },
    #[snafu(display("Error writing the workbook {path}"))]
    Export {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("No resident with id {id}"))]
    UnknownResident { id: String },
    #[snafu(display("Not logged in. Use the login command first."))]
    NotAuthenticated {},
    #[snafu(display("Invalid username or password"))]
    InvalidCredentials {},
    #[snafu(display("Cannot serve on {addr}"))]
    Serving {
        source: std::io::Error,
        addr: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type CanvassResult<T> = Result<T, CanvassError>;
