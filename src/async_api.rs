use crate::upload::{HttpUploader, UploadRequest, UploadResponse, Uploader};
use crate::{EditorConfig, Error, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Upload(UploadRequest, oneshot::Sender<Result<UploadResponse>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly uploader backed by a dedicated worker thread.
///
/// The worker thread owns a blocking `HttpUploader` and executes requests
/// sent from async tasks, so an event loop stays responsive while a POST is
/// in flight. Requests are handled one at a time in submission order; there
/// is no cancellation.
#[derive(Clone)]
pub struct UploadWorker {
    cmd_tx: Sender<Command>,
}

impl UploadWorker {
    /// Spawn the worker thread and build its HTTP client there.
    pub async fn spawn(config: EditorConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            let uploader = match HttpUploader::new(&config) {
                Ok(u) => u,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Upload(request, resp) => {
                        let res = uploader.upload(&request);
                        if let Err(ref e) = res {
                            log::error!("Error uploading images: {}", e);
                        }
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        log::debug!("upload worker for {} closing", uploader.endpoint());
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Submit a request and wait for the endpoint's answer.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResponse> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Upload(request, tx));
        rx.await
            .map_err(|e| Error::Other(format!("Upload canceled: {}", e)))?
    }

    /// Shutdown the background worker.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
