pub fn append_limit_offset_clause(query: &mut String, limit: Option<i64>, offset: i64) {
    if limit.is_some() {
        query.push_str(" LIMIT ?");
        if offset > 0 {
            query.push_str(" OFFSET ?");
        }
    }
}
