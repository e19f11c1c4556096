use serde::{Deserialize, Serialize};

/// 分页结果结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Paginated {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
