//! 标准输入/输出上的 JSON 行协议

use anyhow::Result;
use std::io::BufRead;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use cogip_planner::{InboundRouter, Outbox};
use cogip_protocol::{decode_inbound, encode_outbound};

/// 读取入站事件直到 EOF 或规划器退出
///
/// 在专用线程中以阻塞方式读取，路由本身是同步的。
pub fn read_inbound(input: impl BufRead, router: InboundRouter) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            },
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_inbound(&line) {
            Ok(event) => {
                if !router.route(event) {
                    break;
                }
            },
            Err(e) => warn!("Malformed inbound message dropped: {}", e),
        }
    }
    info!("Input closed");
}

/// 把出站事件逐行写到标准输出，直到发件箱关闭
pub async fn write_outbound(outbox: Arc<Outbox>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = outbox.recv().await {
        let mut line = encode_outbound(&event)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
