use std::cmp::Ordering;

use crate::constants::{
    TAG_DIRECT, TAG_FAVOURITE, TAG_INVITE, TAG_LEAVE, TAG_LOW_PRIORITY, TAG_SERVER_NOTICE,
    TAG_UNTAGGED, USER_TAG_PREFIX,
};

/// Priority of tags without a builtin slot; below every builtin.
const CUSTOM_TAG_PRIORITY: i32 = -4;

pub fn tag_priority(tag: &str) -> i32 {
    match tag {
        TAG_INVITE => 4,
        TAG_FAVOURITE => 3,
        TAG_DIRECT => 2,
        TAG_UNTAGGED => 1,
        TAG_LOW_PRIORITY => -1,
        TAG_SERVER_NOTICE => -2,
        TAG_LEAVE => -3,
        _ => CUSTOM_TAG_PRIORITY,
    }
}

/// Display order: higher priority first, ties by reverse lexicographic name.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    tag_priority(b)
        .cmp(&tag_priority(a))
        .then_with(|| b.cmp(a))
}

/// `^[a-z]+\.[a-z]+(\.[a-z]+)*$`
fn is_namespaced(tag: &str) -> bool {
    let mut segments = 0;
    for segment in tag.split('.') {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_lowercase()) {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Header text for a tag, or `None` when the tag is hidden from display.
pub fn display_name(tag: &str) -> Option<String> {
    let name = match tag {
        TAG_UNTAGGED => "Rooms",
        TAG_FAVOURITE => "Favorites",
        TAG_LOW_PRIORITY => "Low Priority",
        TAG_SERVER_NOTICE => "System Alerts",
        TAG_DIRECT => "People",
        TAG_INVITE => "Invites",
        TAG_LEAVE => "Historical",
        _ => {
            if let Some(user_tag) = tag.strip_prefix(USER_TAG_PREFIX) {
                return Some(user_tag.to_string());
            }
            if is_namespaced(tag) {
                return None;
            }
            return Some(tag.to_string());
        }
    };
    Some(name.to_string())
}

/// Inserts `tag` into a display-ordered list, keeping it sorted.
pub fn insert_sorted(tags: &mut Vec<String>, tag: &str) {
    if tags.iter().any(|t| t == tag) {
        return;
    }
    let pos = tags.partition_point(|t| compare_tags(t, tag) == Ordering::Less);
    tags.insert(pos, tag.to_string());
}
