//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bgnorm::{ImageFetcher, ImageIOService, MatteProvider, NormalizeError, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

/// Cut-out with an opaque rectangle of `color` at `(x, y, w, h)` on a transparent canvas
pub fn cutout(width: u32, height: u32, rect: (u32, u32, u32, u32), color: [u8; 3]) -> RgbaImage {
    let (rx, ry, rw, rh) = rect;
    RgbaImage::from_fn(width, height, |x, y| {
        if x >= rx && x < rx + rw && y >= ry && y < ry + rh {
            Rgba([color[0], color[1], color[2], 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    ImageIOService::encode_png(&DynamicImage::ImageRgba8(image.clone())).unwrap()
}

/// Opaque photo-like JPEG
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    buffer
}

/// Fetcher serving canned bodies from memory; unknown URLs fail like a 404
#[derive(Clone, Default)]
pub struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| {
                NormalizeError::network_error(
                    format!("Failed to download {}", url),
                    "HTTP 404 Not Found",
                )
            })
    }
}

/// Matte that keys out pure white, standing in for a segmentation model
#[derive(Debug, Default)]
pub struct WhiteKeyMatte {
    pub calls: usize,
}

#[async_trait]
impl MatteProvider for WhiteKeyMatte {
    async fn apply(&mut self, image: DynamicImage) -> Result<DynamicImage> {
        self.calls += 1;
        let mut rgba = image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            if pixel.0[..3] == [255, 255, 255] {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn name(&self) -> &str {
        "white-key"
    }
}

/// Matte that always fails
#[derive(Debug, Default)]
pub struct FailingMatte;

#[async_trait]
impl MatteProvider for FailingMatte {
    async fn apply(&mut self, _image: DynamicImage) -> Result<DynamicImage> {
        Err(NormalizeError::matte("model exploded"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Blocking HTTP server answering `GET /<name>` from `routes`, 404 otherwise
///
/// Runs on a background thread for the rest of the test process.
pub fn spawn_http_server(routes: HashMap<String, Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buffer = [0u8; 4096];
            let read = stream.read(&mut buffer).unwrap_or(0);
            let request = String::from_utf8_lossy(&buffer[..read]);
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .trim_start_matches('/')
                .to_string();

            let (status, body) = match routes.get(&path) {
                Some(body) => ("200 OK", body.clone()),
                None => ("404 Not Found", b"not found".to_vec()),
            };
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        }
    });

    format!("http://{}", addr)
}

/// Server that accepts connections and never answers, for timeout paths
///
/// Returns the base URL; accepted sockets stay open for the rest of the process.
pub fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            held.push(stream);
        }
    });

    format!("http://{}", addr)
}
