//! # Generated-Paper Cache
//!
//! In-memory cache for generated papers, keyed by the full generation
//! request. Entries expire after a TTL and the least recently used entry is
//! evicted when the cache is full. Hit and miss counters feed the metrics
//! endpoint.
//!
//! The cache itself is not synchronized; callers wrap it in a lock (see
//! `AppState`).

use crate::questions::models::{GeneratedPaper, GenerationRequest};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct CacheEntry {
    paper: GeneratedPaper,
    created_at: Instant,
}

#[derive(Debug)]
pub struct PaperCache {
    entries: HashMap<String, CacheEntry>,
    // Front is least recently used
    order: VecDeque<String>,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl PaperCache {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
            hits: 0,
            misses: 0,
        }
    }

    /// Cache key for a request. `GenerationRequest` serializes its subjects
    /// through a `BTreeMap`, so equal requests always produce equal keys.
    pub fn key(request: &GenerationRequest) -> String {
        serde_json::to_string(request).unwrap_or_default()
    }

    pub fn get(&mut self, key: &str) -> Option<GeneratedPaper> {
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.created_at.elapsed() < self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };

        if fresh {
            self.hits += 1;
            self.touch(key);
            debug!(hits = self.hits, "Cache hit");
            self.entries.get(key).map(|entry| entry.paper.clone())
        } else {
            self.remove(key);
            self.misses += 1;
            debug!(misses = self.misses, "Cache entry expired");
            None
        }
    }

    pub fn insert(&mut self, key: String, paper: GeneratedPaper) {
        if self.entries.contains_key(&key) {
            self.touch(&key);
        } else {
            while self.entries.len() >= self.max_entries {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                    debug!("Evicted least recently used cache entry");
                } else {
                    break;
                }
            }
            self.order.push_back(key.clone());
        }

        self.entries.insert(
            key,
            CacheEntry {
                paper,
                created_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::models::{ExamType, GenerationMetadata};
    use std::collections::BTreeMap;

    fn paper(total: usize) -> GeneratedPaper {
        GeneratedPaper {
            questions: Vec::new(),
            by_subject: BTreeMap::new(),
            metadata: GenerationMetadata {
                exam: ExamType::Jee,
                total_questions: total,
                subjects: vec!["Physics".to_string()],
                generation_time_secs: 1.0,
                model: "gemini-2.5-flash".to_string(),
                temperature: 0.4,
                success_rate: 1.0,
            },
        }
    }

    #[test]
    fn test_hit_and_miss_counting() {
        let mut cache = PaperCache::new(3600, 10);
        assert!(cache.get("a").is_none());

        cache.insert("a".to_string(), paper(5));
        assert!(cache.get("a").is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = PaperCache::new(0, 10);
        cache.insert("a".to_string(), paper(5));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = PaperCache::new(3600, 2);
        cache.insert("a".to_string(), paper(1));
        cache.insert("b".to_string(), paper(2));

        // Touch "a" so "b" becomes the eviction candidate
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), paper(3));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn test_equal_requests_share_a_key() {
        use crate::questions::models::{Difficulty, SubjectRequest};

        let mut subjects = BTreeMap::new();
        subjects.insert(
            "Physics".to_string(),
            SubjectRequest {
                chapters: vec!["Kinematics".to_string()],
                num_questions: 10,
                difficulty: Difficulty::Medium,
            },
        );
        let first = GenerationRequest {
            exam: ExamType::Jee,
            subjects: subjects.clone(),
        };
        let second = GenerationRequest {
            exam: ExamType::Jee,
            subjects,
        };
        assert_eq!(PaperCache::key(&first), PaperCache::key(&second));
    }
}
