/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: access gate (Bearer token)
 * - cors / http / security_headers: 全ルート共通の横断的関心事
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
