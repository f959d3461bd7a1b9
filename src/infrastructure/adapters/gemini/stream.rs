//! SSE 解码：把响应字节流转换为脚本片段流
//!
//! 服务端按 `data: <json>` 行发送事件，一个事件可能跨多个网络分块

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;

use super::types::GenerateContentResponse;
use crate::application::ports::{FragmentStream, GenerationError};

/// 按行切分的 SSE 解码器
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加分块，返回已完整的 data 负载
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// 流结束时处理没有换行结尾的最后一行
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(&['\r', '\n'][..]);

    // 空行和注释
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    Some(data.to_string())
}

/// 解析单个事件，没有文本时返回 None
pub fn parse_event(data: &str) -> Result<Option<String>, GenerationError> {
    if data == "[DONE]" {
        return Ok(None);
    }

    let response: GenerateContentResponse = serde_json::from_str(data).map_err(|e| {
        GenerationError::InvalidResponse(format!("Failed to parse SSE event: {}", e))
    })?;
    let text = response.into_text()?;

    Ok(Some(text).filter(|t| !t.is_empty()))
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, GenerationError>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn queue(&mut self, data: &str) {
        match parse_event(data) {
            Ok(Some(text)) => self.pending.push_back(Ok(text)),
            Ok(None) => {}
            Err(e) => self.pending.push_back(Err(e)),
        }
    }
}

/// 把 SSE 字节流转换为片段流
///
/// 第一个错误之后流结束
pub fn fragment_stream<S, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(&chunk) {
                        state.queue(&data);
                    }
                }
                Some(Err(e)) => {
                    state
                        .pending
                        .push_back(Err(GenerationError::NetworkError(e.to_string())));
                }
                None => {
                    state.finished = true;
                    if let Some(data) = state.decoder.finish() {
                        state.queue(&data);
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":{}}}]}}}}]}}\r\n\r\n",
            serde_json::to_string(text).unwrap()
        )
    }

    fn body(chunks: Vec<Result<Vec<u8>, String>>) -> impl Stream<Item = Result<Bytes, String>> + Send + Unpin {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(Bytes::from))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, GenerationError>> {
        stream.collect().await
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\n\n: keep-alive\n"), vec!["{\"a\":1}"]);
        assert_eq!(decoder.push(b"data: tail"), Vec::<String>::new());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert_eq!(decoder.finish(), None);
    }

    #[tokio::test]
    async fn test_fragments_in_order_across_chunk_boundaries() {
        let all = format!("{}{}{}", event("Hello "), event("dear "), event("listener."));
        let bytes = all.into_bytes();
        let (a, rest) = bytes.split_at(17);
        let (b, c) = rest.split_at(60);

        let fragments = collect(fragment_stream(body(vec![
            Ok(a.to_vec()),
            Ok(b.to_vec()),
            Ok(c.to_vec()),
        ])))
        .await;

        let texts: Vec<String> = fragments.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(texts, vec!["Hello ", "dear ", "listener."]);
    }

    #[tokio::test]
    async fn test_error_event_ends_stream() {
        let error = "data: {\"error\":{\"code\":500,\"message\":\"internal\",\"status\":\"INTERNAL\"}}\n\n";
        let all = format!("{}{}{}", event("one"), error, event("never"));

        let fragments = collect(fragment_stream(body(vec![Ok(all.into_bytes())]))).await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].as_ref().unwrap(), "one");
        assert!(matches!(fragments[1], Err(GenerationError::ServiceError(_))));
    }

    #[tokio::test]
    async fn test_transport_error_after_fragments() {
        let fragments = collect(fragment_stream(body(vec![
            Ok(event("a").into_bytes()),
            Ok(event("b").into_bytes()),
            Err("connection reset".to_string()),
            Ok(event("c").into_bytes()),
        ])))
        .await;

        assert_eq!(fragments.len(), 3);
        assert!(matches!(fragments[2], Err(GenerationError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_events_without_text_are_skipped() {
        let last = "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}";
        let all = format!("{}{}", event("only"), last);

        let fragments = collect(fragment_stream(body(vec![Ok(all.into_bytes())]))).await;
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_ref().unwrap(), "only");
    }

    #[tokio::test]
    async fn test_malformed_event_is_invalid_response() {
        let fragments = collect(fragment_stream(body(vec![Ok(b"data: {not json\n\n".to_vec())]))).await;
        assert!(matches!(fragments[0], Err(GenerationError::InvalidResponse(_))));
    }
}
