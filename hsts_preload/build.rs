/*!
# HSTS Preload - Build
*/

#[allow(dead_code)]
#[path = "src/builder.rs"]
mod builder;

#[allow(dead_code)]
#[path = "src/hash.rs"]
mod hash;

#[allow(dead_code)]
#[path = "src/table.rs"]
mod table;

use builder::Builder;
use std::{
	env,
	fs::File,
	io::Write,
	path::PathBuf,
};



/// # Bundled Source.
const RAW_FILE: &str = "preload_excerpt.json";

/// # Remote Source.
const RAW_URL: &str = "https://chromium.googlesource.com/chromium/src/net/+/main/http/transport_security_state_static.json?format=TEXT";



/// # Build Resources!
///
/// The more crunching we can do at build time, the faster the runtime
/// experience will be.
///
/// This loads the Chromium HSTS preload list, builds the lookup table, and
/// writes it out as Rust for the library to `include!`.
pub fn main() {
	println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");
	println!("cargo:rerun-if-env-changed=HSTS_PRELOAD_FETCH");
	println!("cargo:rerun-if-env-changed=HSTS_PRELOAD_FILE");
	println!("cargo:rerun-if-env-changed=SHOW_TOTALS");
	println!("cargo:rerun-if-changed=skel/hsts.rs.txt");
	println!("cargo:rerun-if-changed=skel/raw/{RAW_FILE}");
	println!("cargo:rerun-if-changed=src/builder.rs");
	println!("cargo:rerun-if-changed=src/hash.rs");
	println!("cargo:rerun-if-changed=src/table.rs");

	hsts();
}

/// # Build HSTS RS.
///
/// Collect the entries, crunch them, and write the generated script to
/// `OUT_DIR`.
fn hsts() {
	let (raw, source) = hsts_fetch_raw();
	let builder = hsts_load_data(&raw);
	assert!(! builder.is_empty(), "No force-https entries found.");

	let table = builder.build().unwrap_or_else(|e| panic!("{e}"));

	if env::var("SHOW_TOTALS").is_ok() {
		println!(
			"cargo:warning=Parsed {} HSTS entries ({} names bytes, {} seeds, {} slots, max dots {}).",
			table.len(),
			table.names().len(),
			table.level0().len(),
			table.level1().len(),
			table.max_dots(),
		);
	}

	let mut file = File::create(out_path("hsts-preload.rs"))
		.expect("Unable to create hsts-preload.rs");

	write!(
		&mut file,
		include_str!("./skel/hsts.rs.txt"),
		source = source,
		include_subdomains_end = table.include_subdomains_end(),
		max_dots = table.max_dots(),
		len = table.len(),
		names = format!("{:?}", table.names()),
		level0_len = table.level0().len(),
		level0 = hsts_format_array(table.level0(), |n| n.to_string()),
		level1_len = table.level1().len(),
		level1 = hsts_format_array(table.level1(), |n| format!("{n:#010x}")),
	)
		.and_then(|()| file.flush())
		.expect("Unable to save reference table.");
}

/// # Fetch Raw Data.
///
/// This returns the raw JSON (comments and all), along with a description of
/// where it came from.
///
/// If the `HSTS_PRELOAD_FETCH` environment variable is set, a fresh copy is
/// downloaded from Chromium's repository. Otherwise `HSTS_PRELOAD_FILE` can
/// point to a local copy of `transport_security_state_static.json`. Failing
/// both, the small excerpt bundled with this library is used.
fn hsts_fetch_raw() -> (String, String) {
	if env::var_os("HSTS_PRELOAD_FETCH").is_some() {
		(download_file(RAW_URL), RAW_URL.to_owned())
	}
	else if let Some(path) = env::var_os("HSTS_PRELOAD_FILE").map(PathBuf::from) {
		println!("cargo:rerun-if-changed={}", path.display());
		let raw = std::fs::read_to_string(&path)
			.unwrap_or_else(|e| panic!("Unable to load {}: {e}", path.display()));
		(raw, path.display().to_string())
	}
	else {
		println!("cargo:warning=Embedding the bundled HSTS excerpt; set HSTS_PRELOAD_FETCH or HSTS_PRELOAD_FILE for the full list.");
		(load_file(RAW_FILE), format!("the bundled {RAW_FILE} excerpt"))
	}
}

/// # Load Data.
///
/// Parse the raw list, keeping only the `force-https` entries, and feed them
/// to a new [`Builder`], which takes care of the IDNA normalization.
fn hsts_load_data(raw: &str) -> Builder {
	// The list is JSON, but with line comments.
	let json: String = raw.lines()
		.filter(|line| ! line.trim_start().starts_with("//"))
		.collect::<Vec<&str>>()
		.join("\n");

	let json: serde_json::Value = serde_json::from_str(&json)
		.expect("Unable to parse the HSTS preload list.");
	let entries = json.get("entries")
		.and_then(serde_json::Value::as_array)
		.expect("The HSTS preload list has no entries.");

	let mut out = Builder::new();
	for entry in entries {
		if entry.get("mode").and_then(serde_json::Value::as_str) != Some("force-https") {
			continue;
		}

		let Some(name) = entry.get("name").and_then(serde_json::Value::as_str) else {
			continue;
		};
		let subdomains = entry.get("include_subdomains")
			.and_then(serde_json::Value::as_bool)
			.unwrap_or(false);

		// IPs and invalid names can never match, so aren't worth a slot.
		if ! out.push(name, subdomains) && env::var("SHOW_TOTALS").is_ok() {
			println!("cargo:warning=Skipping HSTS name {name:?}.");
		}
	}

	out
}

/// # Format Array.
///
/// Format the values for inclusion in a static array, 32 per line.
fn hsts_format_array<T, F>(src: &[T], cb: F) -> String
where F: Fn(&T) -> String {
	let mut out = String::with_capacity(src.len() * 12);
	for chunk in src.chunks(32) {
		out.push('\t');
		for v in chunk {
			out.push_str(&cb(v));
			out.push_str(", ");
		}
		out.truncate(out.len() - 1);
		out.push('\n');
	}
	out
}



/// # Download File.
///
/// Fetch the Gitiles `?format=TEXT` view, which wraps the file in base64.
fn download_file(url: &str) -> String {
	use base64::Engine;

	let res = minreq::get(url)
		.with_header("user-agent", "Mozilla/5.0")
		.with_timeout(60)
		.send()
		.unwrap_or_else(|e| panic!("Unable to download {url}: {e}"));
	assert!(
		(200..=399).contains(&res.status_code),
		"Unable to download {url}: status {}", res.status_code,
	);

	let body: Vec<u8> = res.as_bytes()
		.iter()
		.copied()
		.filter(|b| ! b.is_ascii_whitespace())
		.collect();
	let raw = base64::engine::general_purpose::STANDARD.decode(body)
		.expect("Unable to decode the HSTS preload list.");
	String::from_utf8(raw).expect("The HSTS preload list is not UTF-8.")
}

/// # Load File.
///
/// Read the third-party data file into a string.
fn load_file(name: &str) -> String {
	match std::fs::read_to_string(format!("./skel/raw/{name}")) {
		Ok(x) => x,
		Err(_) => panic!("Unable to load {name}."),
	}
}

/// # Out path.
///
/// This generates a (file/dir) path relative to `OUT_DIR`.
fn out_path(name: &str) -> PathBuf {
	let dir = env::var("OUT_DIR").expect("Missing OUT_DIR.");
	let mut out = std::fs::canonicalize(dir).expect("Missing OUT_DIR.");
	out.push(name);
	out
}
