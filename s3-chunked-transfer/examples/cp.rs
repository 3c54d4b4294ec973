/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;
use std::time;

use aws_smithy_types::error::display::DisplayErrorContext;
use clap::{CommandFactory, Parser};
use s3_chunked_transfer::io::InputStream;
use s3_chunked_transfer::metrics::unit::ByteUnit;

type BoxError = Box<dyn Error + Send + Sync>;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "cp")]
#[command(about = "Copies a local file to an S3-compatible store or an object to a local file.")]
pub struct Args {
    /// Source to copy from <S3Uri | Local>
    #[arg(required = true)]
    source: TransferUri,

    /// Destination to copy to <S3Uri | Local>
    #[arg(required = true)]
    dest: TransferUri,

    /// Address of the store, e.g. localhost:9000. Uses the AWS endpoint resolution when omitted.
    #[arg(long)]
    endpoint: Option<String>,

    /// Access key (requires --secret-key)
    #[arg(long, requires = "secret_key")]
    access_key: Option<String>,

    /// Secret key (requires --access-key)
    #[arg(long, requires = "access_key")]
    secret_key: Option<String>,

    /// Connect to the endpoint over TLS
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    tls: bool,

    /// Number of bytes read from the source at a time
    #[arg(long, default_value_t = 32768)]
    chunk_size: u64,

    /// Part size and multipart threshold
    #[arg(long, default_value_t = 5242880)]
    part_size: u64,
}

#[derive(Clone, Debug)]
enum TransferUri {
    /// Local filesystem source/destination
    Local(PathBuf),

    /// S3 source/destination
    S3(S3Uri),
}

impl FromStr for TransferUri {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri = match s.strip_prefix("s3://") {
            Some(rest) => TransferUri::S3(S3Uri::parse(rest)?),
            None => TransferUri::Local(PathBuf::from(s)),
        };
        Ok(uri)
    }
}

#[derive(Clone, Debug)]
struct S3Uri {
    bucket: String,
    key: String,
}

impl S3Uri {
    fn parse(uri: &str) -> Result<Self, BoxError> {
        match uri.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(S3Uri {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            }),
            _ => Err(format!("expected s3://bucket/key, got s3://{uri}").into()),
        }
    }
}

fn invalid_arg(message: &str) -> ! {
    Args::command()
        .error(clap::error::ErrorKind::InvalidValue, message)
        .exit()
}

async fn client(args: &Args) -> Result<s3_chunked_transfer::Client, BoxError> {
    let mut loader = s3_chunked_transfer::from_env()
        .use_tls(args.tls)
        .chunk_size(args.chunk_size)
        .part_size(args.part_size);
    if let Some(endpoint) = &args.endpoint {
        loader = loader.endpoint(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        loader = loader.credentials(access_key, secret_key);
    }

    let config = loader.load().await?;
    Ok(s3_chunked_transfer::Client::new(config))
}

fn report(verb: &str, bytes: u64, elapsed: time::Duration) {
    let megabits = ByteUnit::Mebibyte.convert(bytes) * 8f64;
    println!(
        "{verb} {} in {elapsed:?}; Mib/s: {:.3}",
        ByteUnit::display(bytes),
        megabits / elapsed.as_secs_f64(),
    );
}

async fn do_upload(args: &Args, path: &PathBuf, dest: &S3Uri) -> Result<(), BoxError> {
    let tm = client(args).await?;

    println!("starting upload");
    let start = time::Instant::now();

    let handle = tm
        .upload()
        .bucket(&dest.bucket)
        .key(&dest.key)
        .body(InputStream::from_path(path))
        .send()
        .await?;

    let output = handle.join().await?;
    tracing::info!("upload output: {output:?}");

    report("uploaded", output.bytes_transferred(), start.elapsed());
    Ok(())
}

async fn do_download(args: &Args, source: &S3Uri, path: &PathBuf) -> Result<(), BoxError> {
    let tm = client(args).await?;

    let start = time::Instant::now();
    let output = tm
        .download()
        .bucket(&source.bucket)
        .key(&source.key)
        .destination(path)
        .send()
        .await?;

    report("downloaded", output.bytes_written(), start.elapsed());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    use TransferUri::*;
    let result = match (&args.source, &args.dest) {
        (Local(path), S3(dest)) => do_upload(&args, path, dest).await,
        (Local(_), Local(_)) => invalid_arg("local to local transfer not supported"),
        (S3(source), Local(path)) => do_download(&args, source, path).await,
        (S3(_), S3(_)) => invalid_arg("s3 to s3 transfer not supported"),
    };

    if let Err(ref err) = result {
        tracing::error!("transfer failed: {}", DisplayErrorContext(err.as_ref()));
    }

    result
}
