use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rusty-crm",
    version,
    about = "Organization and contact directory"
)]
pub struct Cli {
    /// Organization backend (local, remote)
    #[arg(long, env = "STORAGE_CHOICE", default_value_t = String::from("local"))]
    pub storage: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommand and their flags
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List organizations
    List {
        /// Match name, email or category
        #[arg(short, long)]
        search: Option<String>,

        /// Only this category (e.g. additive-manufacturing)
        #[arg(short, long)]
        category: Option<String>,

        /// Show organizations with a non-working website first
        #[arg(long)]
        broken_first: bool,
    },

    /// Add a new organization
    Add {
        #[arg(long)]
        name: String,

        #[command(flatten)]
        fields: OrganizationFields,
    },

    /// Edit an organization
    /// Only the fields given are changed
    Edit {
        /// Organization id
        #[arg(long)]
        id: String,

        /// Version the edit is based on (defaults to the version just read)
        #[arg(long)]
        if_match: Option<String>,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: OrganizationFields,
    },

    /// Delete an organization together with its contacts
    Delete {
        /// Organization id
        #[arg(long)]
        id: String,

        /// Version the delete is based on (defaults to the version just read)
        #[arg(long)]
        if_match: Option<String>,
    },

    /// List the contacts of an organization
    Contacts {
        /// Organization id
        #[arg(long)]
        org: String,
    },

    /// Add a contact to an organization
    AddContact {
        /// Organization id
        #[arg(long)]
        org: String,

        #[arg(long)]
        name: String,

        /// Role or position
        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Preferred language (DE, EN, FR)
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a contact
    DeleteContact {
        /// Contact id
        #[arg(long)]
        id: String,
    },

    /// Import a workbook, replacing all organizations and contacts
    Import {
        /// File path to the source workbook (.xlsx, .xls, .zip or .json)
        #[arg(short, long)]
        src: String,

        /// Delimiter of the printed email list (comma, semicolon, newline)
        #[arg(short, long, default_value_t = String::from("comma"))]
        delimiter: String,
    },

    /// Export organizations and contacts to a workbook
    Export {
        /// File path or directory for the export file
        #[arg(short, long)]
        des: Option<String>,

        /// Workbook format (xlsx, zip, json)
        #[arg(short, long, default_value_t = String::from("xlsx"))]
        format: String,
    },

    /// Re-join an email list with another delimiter
    Emails {
        #[arg(short, long)]
        text: String,

        /// comma, semicolon or newline
        #[arg(short, long, default_value_t = String::from("comma"))]
        delimiter: String,
    },

    /// Contact emails for a bulk email, of all or of the given organizations
    Recipients {
        /// Organization id, repeatable
        #[arg(long)]
        org: Vec<String>,

        /// comma, semicolon or newline
        #[arg(short, long, default_value_t = String::from("comma"))]
        delimiter: String,
    },

    /// Show the signed-in user (remote backend only)
    Whoami,

    /// List the users of this installation (administrators only)
    Users,

    /// Register a user. The first user becomes the administrator
    AddUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,
    },

    /// Grant or revoke a user's access to the directory
    Grant {
        /// Email of the user
        #[arg(long)]
        email: String,
    },

    /// Give or take away a user's administrator role
    Admin {
        /// Email of the user
        #[arg(long)]
        email: String,
    },
}

/// Optional organization fields shared by `add` and `edit`
#[derive(clap::Args, Debug, Default)]
pub struct OrganizationFields {
    #[arg(long)]
    pub website: Option<String>,

    /// working or not-working
    #[arg(long)]
    pub website_status: Option<String>,

    #[arg(long)]
    pub linkedin: Option<String>,

    /// Country or region
    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// active, inactive or closed
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Custom field as key=value, repeatable. An empty value removes the key
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub custom: Vec<String>,
}
