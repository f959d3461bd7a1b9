//! Voice Catalog - 固定音色表
//!
//! 新增音色只需在 `VOICE_CATALOG` 中添加一行

use serde::Serialize;

/// 音色档案（展示名称 → 合成服务的音色 ID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceProfile {
    /// 展示给用户的名称
    pub label: &'static str,
    /// ElevenLabs 音色 ID（不透明字符串）
    pub voice_id: &'static str,
}

/// 默认音色
pub const DEFAULT_VOICE_LABEL: &str = "Bill (American, trustworthy, narration)";

/// 音色目录
pub const VOICE_CATALOG: &[VoiceProfile] = &[
    VoiceProfile {
        label: "Bill (American, trustworthy, narration)",
        voice_id: "pqHfZKP75CvOlQylNhV4",
    },
    VoiceProfile {
        label: "Brian (American, deep, narration)",
        voice_id: "nPczCjzI2devNBz1zQrb",
    },
    VoiceProfile {
        label: "Adam (American, deep, narration)",
        voice_id: "pNInz6obpgDQGcFmaJgB",
    },
    VoiceProfile {
        label: "Liam (American, articulate, narration)",
        voice_id: "TX3LPaxmHKxFdv7VOQHJ",
    },
    VoiceProfile {
        label: "George (British, warm, narration)",
        voice_id: "JBFqnCBsd6RMkjVDRZzb",
    },
    VoiceProfile {
        label: "Daniel (British, authoritative, news)",
        voice_id: "onwK4e9ZLuTAKqWW03F9",
    },
    VoiceProfile {
        label: "Charlie (Australian, natural, conversational)",
        voice_id: "IKne3meq5aSn9XLyUdCD",
    },
    VoiceProfile {
        label: "Callum (Transatlantic, intense, characters)",
        voice_id: "N2lVS1w4EtoT3dr4eOWO",
    },
];

/// 所有可选音色
pub fn all_voices() -> &'static [VoiceProfile] {
    VOICE_CATALOG
}

/// 按展示名称查找
pub fn find_by_label(label: &str) -> Option<&'static VoiceProfile> {
    VOICE_CATALOG.iter().find(|v| v.label == label)
}

/// 按音色 ID 查找
pub fn find_by_id(voice_id: &str) -> Option<&'static VoiceProfile> {
    VOICE_CATALOG.iter().find(|v| v.voice_id == voice_id)
}

/// 解析用户选择：先按名称，再按 ID
pub fn resolve(selection: &str) -> Option<&'static VoiceProfile> {
    let selection = selection.trim();
    find_by_label(selection).or_else(|| find_by_id(selection))
}

/// 默认音色
pub fn default_voice() -> &'static VoiceProfile {
    find_by_label(DEFAULT_VOICE_LABEL).unwrap_or(&VOICE_CATALOG[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_label_resolves_to_its_own_id() {
        for profile in VOICE_CATALOG {
            let found = find_by_label(profile.label).unwrap();
            assert_eq!(found.voice_id, profile.voice_id);
            assert_eq!(resolve(profile.label).unwrap().voice_id, profile.voice_id);
        }
    }

    #[test]
    fn test_labels_and_ids_are_unique() {
        let labels: HashSet<_> = VOICE_CATALOG.iter().map(|v| v.label).collect();
        let ids: HashSet<_> = VOICE_CATALOG.iter().map(|v| v.voice_id).collect();
        assert_eq!(labels.len(), VOICE_CATALOG.len());
        assert_eq!(ids.len(), VOICE_CATALOG.len());
    }

    #[test]
    fn test_bill_voice_id() {
        let bill = find_by_label("Bill (American, trustworthy, narration)").unwrap();
        assert_eq!(bill.voice_id, "pqHfZKP75CvOlQylNhV4");
        assert_eq!(default_voice(), bill);
    }

    #[test]
    fn test_resolve_by_id_and_unknown() {
        assert_eq!(
            resolve("JBFqnCBsd6RMkjVDRZzb").unwrap().label,
            "George (British, warm, narration)"
        );
        assert!(resolve("Nobody (Martian, silent)").is_none());
    }
}
