// ==========================================
// BMN 资产台账 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道 / 批量接口的可调参数
// 实现者: ConfigManager（config_kv 表）, ImportSettings（内存默认值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 表头扫描行数
    ///
    /// # 默认值
    /// - 20
    async fn get_header_scan_rows(&self) -> ImportResult<usize>;

    /// 表头关键词（按词匹配，小写）
    ///
    /// # 默认值
    /// - nama, kode, urut, nup, no
    async fn get_header_keywords(&self) -> ImportResult<Vec<String>>;

    /// 未提供 jenis_bmn 时的默认类别标签
    ///
    /// # 默认值
    /// - Tanah
    async fn get_default_category(&self) -> ImportResult<String>;

    /// 可疑 kode_barang 位数（恰为 N 位数字时告警，0 表示关闭）
    ///
    /// # 默认值
    /// - 4
    async fn get_suspicious_code_digits(&self) -> ImportResult<usize>;

    /// 批量接口请求体上限（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_payload_bytes(&self) -> ImportResult<usize>;
}
