use log::warn;

use crate::models::upstream::StreamFrame;

#[derive(Debug, Clone)]
pub enum SseEvent {
    Frame(StreamFrame),
    Done,
}

/// Incremental decoder for the relay's `data: {json}` line stream. Chunks
/// may split lines (and multi-byte characters) at arbitrary byte offsets, so
/// raw bytes are buffered and only complete lines are interpreted.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }

            let data = match line.strip_prefix("data:") {
                Some(rest) => rest.trim_start(),
                None => continue,
            };
            if data == "[DONE]" {
                events.push(SseEvent::Done);
                continue;
            }
            match serde_json::from_str::<StreamFrame>(data) {
                Ok(frame) => events.push(SseEvent::Frame(frame)),
                Err(e) => {
                    // Malformed frames are dropped; the stream keeps going.
                    warn!("Skipping malformed stream frame: {} ({})", data, e);
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(events: &[SseEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                SseEvent::Frame(f) => f.answer.clone(),
                SseEvent::Done => None,
            })
            .collect()
    }

    #[test]
    fn decodes_complete_frames_in_order() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"answer\":\"He\"}\ndata: {\"answer\":\"llo\"}\n");
        assert_eq!(events.len(), 2);
        assert_eq!(answers(&events), "Hello");
    }

    #[test]
    fn done_sentinel_is_reported() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: [DONE]\n");
        assert!(matches!(events[0], SseEvent::Done));
    }

    #[test]
    fn buffers_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"ans").is_empty());
        let events = decoder.push(b"wer\":\"Hi\"}\n");
        assert_eq!(answers(&events), "Hi");
    }

    #[test]
    fn survives_multibyte_characters_split_across_chunks() {
        let frame = "data: {\"answer\":\"nächste Schicht\"}\n".as_bytes();
        let mut decoder = SseDecoder::new();
        // Cut inside the two-byte 'ä'.
        let cut = frame.iter().position(|&b| b > 0x7f).unwrap() + 1;
        assert!(decoder.push(&frame[..cut]).is_empty());
        let events = decoder.push(&frame[cut..]);
        assert_eq!(answers(&events), "nächste Schicht");
    }

    #[test]
    fn malformed_json_is_skipped_not_fatal() {
        let mut decoder = SseDecoder::new();
        let events =
            decoder.push(b"data: {not json}\ndata: {\"answer\":\"ok\"}\ndata: [DONE]\n");
        assert_eq!(events.len(), 2);
        assert_eq!(answers(&events), "ok");
        assert!(matches!(events[1], SseEvent::Done));
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"answer\":\"a\"}\r\n\r\nevent: ping\r\ndata: [DONE]\r\n");
        assert_eq!(events.len(), 2);
        assert_eq!(answers(&events), "a");
    }

    #[test]
    fn conversation_id_comes_through() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"conversation_id\":\"abc123\",\"answer\":\"\"}\n");
        match &events[0] {
            SseEvent::Frame(f) => assert_eq!(f.conversation_id.as_deref(), Some("abc123")),
            SseEvent::Done => panic!("expected frame"),
        }
    }
}
