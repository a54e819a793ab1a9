use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use fedifmt_core::{
    Account, ContentType, EmojiRecord, FieldOptions, FormatOptions, StaticLinker, format,
    format_field, format_plain,
};

enum Mode {
    Status,
    Field,
    Plain,
}

fn main() {
    let mut input: Option<String> = None;
    let mut local = true;
    let mut content_type = ContentType::Plain;
    let mut mode = Mode::Status;
    let mut autoplay = false;
    let mut base_url = "https://localhost".to_string();
    let mut reblog: Option<String> = None;
    let mut emojis: Vec<EmojiRecord> = Vec::new();
    let mut linkable: Vec<Account> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--remote" => local = false,
            "--field" => mode = Mode::Field,
            "--plain" => mode = Mode::Plain,
            "--autoplay" => autoplay = true,
            "--content-type" => {
                content_type = match args.next().as_deref() {
                    Some("plain") => ContentType::Plain,
                    Some("html") => ContentType::Html,
                    Some("markdown") => ContentType::Markdown,
                    _ => {
                        eprintln!("--content-type expects: plain | html | markdown");
                        process::exit(2);
                    }
                };
            }
            "--base-url" => {
                base_url = args.next().unwrap_or_else(|| {
                    eprintln!("--base-url expects a URL");
                    process::exit(2);
                });
            }
            "--reblog" => {
                reblog = Some(args.next().unwrap_or_else(|| {
                    eprintln!("--reblog expects an account handle");
                    process::exit(2);
                }));
            }
            "--emoji" => {
                let spec = args.next().unwrap_or_else(|| {
                    eprintln!("--emoji expects shortcode=url[,static_url]");
                    process::exit(2);
                });
                match parse_emoji(&spec) {
                    Some(record) => emojis.push(record),
                    None => {
                        eprintln!("invalid --emoji value: {}", spec);
                        process::exit(2);
                    }
                }
            }
            "--acct" => {
                let handle = args.next().unwrap_or_else(|| {
                    eprintln!("--acct expects user or user@domain");
                    process::exit(2);
                });
                linkable.push(parse_acct(&handle));
            }
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let text = match input {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path, err);
            process::exit(1);
        }),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).unwrap_or_else(|err| {
                eprintln!("failed to read stdin: {}", err);
                process::exit(1);
            });
            buffer
        }
    };
    let text = text.trim_end_matches('\n');

    let linker = StaticLinker::new(base_url);
    let output = match mode {
        Mode::Plain => Ok(format_plain(text, local)),
        Mode::Field => {
            let options = FieldOptions {
                local,
                linkable: &linkable,
                emojis: &emojis,
                autoplay,
            };
            format_field(text, &options, &linker)
        }
        Mode::Status => {
            let options = FormatOptions {
                local,
                content_type,
                linkable: &linkable,
                emojis: &emojis,
                autoplay,
                reblog_prefix: reblog.as_deref(),
            };
            format(text, &options, &linker)
        }
    };

    match output {
        Ok(html) => println!("{}", html),
        Err(err) => {
            eprintln!("format failed: {}", err);
            process::exit(1);
        }
    }
}

fn parse_emoji(spec: &str) -> Option<EmojiRecord> {
    let (shortcode, urls) = spec.split_once('=')?;
    if shortcode.is_empty() || urls.is_empty() {
        return None;
    }
    let (url, static_url) = match urls.split_once(',') {
        Some((url, static_url)) => (url, static_url),
        None => (urls, urls),
    };
    Some(EmojiRecord::new(shortcode, url, static_url))
}

fn parse_acct(handle: &str) -> Account {
    let handle = handle.strip_prefix('@').unwrap_or(handle);
    match handle.split_once('@') {
        Some((username, domain)) => Account::remote(username, domain),
        None => Account::local(handle),
    }
}

fn print_usage() {
    eprintln!(
        "usage: fedifmt-cli [options] [file]\n\
         \n\
         Formats status text (from file or stdin) into HTML.\n\
         \n\
         options:\n\
         \x20 --content-type <plain|html|markdown>  input content type (default plain)\n\
         \x20 --remote                              treat input as foreign content (sanitize only)\n\
         \x20 --field                               profile-field mode (URL/mention linking only)\n\
         \x20 --plain                               plaintext mode (strip markup)\n\
         \x20 --autoplay                            use animated emoji assets\n\
         \x20 --emoji <code=url[,static_url]>       add a custom emoji (repeatable)\n\
         \x20 --acct <user[@domain]>                add a linkable account (repeatable)\n\
         \x20 --reblog <handle>                     prepend an RT @handle prefix\n\
         \x20 --base-url <url>                      base URL for generated links\n\
         \x20 -h, --help                            show this help"
    );
}
