//! Podcast Context - Value Objects

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PodcastError;

/// PDF 的 MIME 类型
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// 固定的生成指令
pub const BASE_INSTRUCTION: &str = "Generate a podcast script based on the following PDF file.\n\
There must only be one male podcast host and zero guests.\n\
Do it in the style of a radio show.\n\
Do not include any sound effects. Do not include music. \
Do not include any other types of effects to the script.\n\
Give me the script without any formatting. \
i.e. do not include Host: or Guest: headers or (starts/ends)";

/// 用户上传的文档
///
/// 不变量:
/// - 内容非空
/// - 声明类型为 PDF
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    bytes: Bytes,
    file_name: Option<String>,
}

impl UploadedDocument {
    /// 校验并创建上传文档
    ///
    /// 声明类型为 `application/pdf` 时接受；浏览器未给出类型
    /// （缺省或 `application/octet-stream`）时按 `.pdf` 扩展名判断
    pub fn new(
        bytes: impl Into<Bytes>,
        media_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Self, PodcastError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(PodcastError::EmptyDocument);
        }

        let declared = media_type
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty());
        let has_pdf_name = file_name
            .map(|f| f.to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false);

        let accepted = match declared.as_deref() {
            Some(PDF_MEDIA_TYPE) => true,
            None | Some("application/octet-stream") => has_pdf_name,
            Some(_) => false,
        };

        if !accepted {
            let described = declared
                .or_else(|| file_name.map(|f| f.to_string()))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(PodcastError::NotPdf(described));
        }

        Ok(Self {
            bytes,
            file_name: file_name.map(|f| f.to_string()),
        })
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// 上传到生成服务时使用的显示名称
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("Uploaded PDF")
    }
}

/// 实际发送给生成服务的指令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction(String);

impl Instruction {
    /// 固定指令 + 可选追加内容
    ///
    /// 追加内容非空时以换行拼接在固定指令之后，原样保留
    pub fn compose(addendum: Option<&str>) -> Self {
        match addendum {
            Some(extra) if !extra.is_empty() => Self(format!("{}\n{}", BASE_INSTRUCTION, extra)),
            _ => Self(BASE_INSTRUCTION.to_string()),
        }
    }

    pub fn base() -> Self {
        Self::compose(None)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_INSTRUCTION
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 按到达顺序拼接的脚本文本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptText {
    text: String,
    fragments: usize,
}

impl ScriptText {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个片段，返回该片段的序号
    pub fn push(&mut self, fragment: &str) -> usize {
        self.text.push_str(fragment);
        self.fragments += 1;
        self.fragments - 1
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// 临时文件令牌（每个文件一个新的随机 UUID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactToken(Uuid);

impl ArtifactToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 生成带扩展名的文件名
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }

    /// 从 `file_name` 生成的文件名中还原令牌，格式不符时返回 None
    pub fn from_file_name(name: &str, extension: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        if ext != extension {
            return None;
        }
        Uuid::parse_str(stem).ok().map(Self)
    }
}

impl Default for ArtifactToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArtifactToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音色塑形参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

/// 语音合成参数（固定）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    /// 编码 / 采样率 / 比特率
    pub output_format: &'static str,
    /// 低延迟模型
    pub model_id: &'static str,
    pub voice_settings: VoiceSettings,
}

impl SynthesisParams {
    /// 播客音频参数：MP3 22.05kHz 32kbps，turbo 模型，
    /// 最大化与参考音色的相似度、最小化风格化
    pub const fn podcast() -> Self {
        Self {
            output_format: "mp3_22050_32",
            model_id: "eleven_turbo_v2_5",
            voice_settings: VoiceSettings {
                stability: 0.0,
                similarity_boost: 1.0,
                style: 0.0,
                use_speaker_boost: true,
            },
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self.output_format.split('_').next() {
            Some("pcm") => "pcm",
            Some("ulaw") => "ulaw",
            Some("opus") => "opus",
            _ => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self.file_extension() {
            "mp3" => "audio/mpeg",
            "opus" => "audio/ogg",
            _ => "application/octet-stream",
        }
    }
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self::podcast()
    }
}
