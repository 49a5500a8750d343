use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "smartcustom")]
#[command(about = "Interactive customer-support chat backed by an OpenAI-compatible API", long_about = None)]
pub struct Args {
    #[arg(short = 'u', long = "user", help = "User id the conversations belong to")]
    pub user: Option<String>,

    #[arg(long = "no-tools", help = "Do not offer tools to the model")]
    pub no_tools: bool,

    #[arg(
        short = 't',
        long = "tool",
        help = "Offer only these tools (repeatable; default: all enabled tools)"
    )]
    pub tools: Vec<String>,

    #[arg(short = 'v', long = "verbose", help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long = "api-endpoint",
        help = "Custom API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(long = "model", help = "Model name to request")]
    pub model: Option<String>,
}
