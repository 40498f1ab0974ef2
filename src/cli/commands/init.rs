//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "dashport.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Dashport configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your topics and holidays", self.output);
                println!("  2. Add the dashboard session cookies under [[dashboard.cookies]]");
                println!("     and keep their values in a .env file");
                println!("  3. Start chromedriver (default endpoint http://localhost:9515)");
                println!("  4. Validate configuration: dashport validate-config");
                println!("  5. Start the scheduler: dashport run");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Sample configuration with the default topic and 2025 holiday tables
    pub fn generate_config() -> String {
        r#"# Dashport Configuration File
# Scheduled dashboard export runner

[application]
log_level = "info"

# ============================================================================
# Dashboard and browser session
# ============================================================================
[dashboard]
base_url = "https://yuqing.nybkz.com"
downloads_path = "/nindex/userCenter/myDownload"
topics_path = "/nindex/publicSentiment/informationSet"

# chromedriver endpoint
webdriver_url = "http://localhost:9515"

# Browser executable (DASHPORT_BROWSER_BINARY overrides this)
# browser_binary = "/usr/bin/google-chrome"
headless = false
window_width = 1600
window_height = 900
default_timeout_ms = 60000

# Session cookies; keep the values out of this file
# [[dashboard.cookies]]
# name = "HMACCOUNT"
# value = "${DASHPORT_HMACCOUNT}"
# domain = ".yuqing.nybkz.com"
# path = "/"

# ============================================================================
# Schedule
# ============================================================================
[schedule]
# Daily trigger time (local, HH:MM)
trigger_time = "14:00"

# Longest single sleep while waiting, in seconds
sleep_slice_seconds = 60

# 2025 public holidays
holidays = [
    "2025-01-01",
    "2025-01-29", "2025-01-30", "2025-01-31", "2025-02-01", "2025-02-02", "2025-02-03",
    "2025-04-05",
    "2025-05-01", "2025-05-02", "2025-05-03",
    "2025-05-31",
    "2025-09-13",
    "2025-10-01", "2025-10-02", "2025-10-03", "2025-10-04", "2025-10-05", "2025-10-06", "2025-10-07",
]

# ============================================================================
# Export behaviour
# ============================================================================
[export]
max_retries = 3
launch_retries = 3
export_timeout_minutes = 30
# Poll slowly while any export is below this progress
slow_progress_threshold = 50
extra_source = "小红书"

[export.waits]
page_load_ms = 5000
animation_ms = 1000
folder_expand_ms = 500
dropdown_show_ms = 2000
input_settle_ms = 300
export_check_ms = 60000
fast_poll_ms = 30000
retry_wait_ms = 30000
file_download_ms = 10000
launch_retry_wait_ms = 10000

[status_text]
success = ["成功"]
exporting = ["正在导出", "导出中"]
failed = ["失败"]

# ============================================================================
# Topics (name as shown in the topic tree, folder that contains it)
# ============================================================================
[[topics]]
id = 1
name = "健康-1汤臣倍健"
folder = "产品"

[[topics]]
id = 2
name = "健康-2片仔癀"
folder = "产品"

[[topics]]
id = 3
name = "健康-3白云山"
folder = "产品"

[[topics]]
id = 4
name = "健康-4云南白药"
folder = "产品"

[[topics]]
id = 5
name = "健康-5燕之屋"
folder = "产品"

[[topics]]
id = 6
name = "健康-6小仙炖"
folder = "产品"

[[topics]]
id = 7
name = "健康-7寿仙谷"
folder = "产品"

[[topics]]
id = 8
name = "健康-8东阿阿胶"
folder = "产品"

[[topics]]
id = 9
name = "健康-主词"
folder = "非创建者勿动1"

[[topics]]
id = 10
name = "健康-组合-高级"
folder = "非创建者勿动1"

# ============================================================================
# Downloads
# ============================================================================
[downloads]
folder = "downloads"
file_prefix = "智舆情数据每日导出"
file_extension = ".zip"
# Only archives created this recently are renamed, in minutes
window_minutes = 5
open_folder = true

[ledger]
path = "execution_record.json"
history_days = 7

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = true
local_path = "logs"
# daily | hourly | never
local_rotation = "daily"

# UI selectors default to the dashboard's current markup; override any of
# them under [selectors] when the page changes.
"#
        .to_string()
    }
}
